pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod exec;
pub mod interrupt;
pub mod preflight;
pub mod progress;
pub mod registry;
pub mod retention;
pub mod storage;

pub use classify::{classify, Classification, ErrorCategory};
pub use config::AppConfig;
pub use engine::{BackupOrchestrator, BatchReport, DeletionOrchestrator, OperationResult, ResultStatus};
pub use error::Error;
pub use interrupt::Interrupt;
pub use progress::{BatchReporter, SilentReporter};
