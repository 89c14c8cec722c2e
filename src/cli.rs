use backup_warden::estimate::BackupFormat;
use backup_warden::retention::SelectionInput;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "backup-warden")]
#[command(about = "Backup lifecycle administration for registered databases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create backups of one or more databases
    Backup(BackupArgs),
    /// Check that the backup volume can hold a backup run
    Preflight(PreflightArgs),
    /// Delete backups by timestamp, date bounds, or entirely
    Rm(RmArgs),
    /// Show backup storage usage and snapshots
    Storage(StorageArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
#[group(id = "targets", required = true, multiple = false)]
pub struct Targets {
    /// Database name(s)
    #[arg(short = 'I', long = "ib", num_args = 1.., value_name = "NAME")]
    pub ib: Vec<String>,
    /// Every database from the database list
    #[arg(short = 'A', long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    #[command(flatten)]
    pub targets: Targets,
    /// Backup format
    #[arg(short, long, value_enum)]
    pub format: BackupFormat,
    /// Simulate without creating a backup
    #[arg(short = 'n', long = "dry-run", visible_alias = "dry")]
    pub dry_run: bool,
    /// Start even if the capacity check fails
    #[arg(long)]
    pub skip_preflight: bool,
}

#[derive(Debug, Args)]
pub struct PreflightArgs {
    #[command(flatten)]
    pub targets: Targets,
    /// Backup format
    #[arg(short, long, value_enum, default_value = "dump")]
    pub format: BackupFormat,
    /// Extra space to keep free, in GB (defaults to the configured margin)
    #[arg(short, long)]
    pub margin: Option<f64>,
}

#[derive(Debug, Args)]
pub struct RmArgs {
    #[command(flatten)]
    pub targets: Targets,
    /// Exact snapshot: YYYYMMDD_HHMMSS or 'dd.mm.yyyy HH:MM:SS'
    #[arg(short = 't', long = "at", visible_alias = "timestamp", value_name = "TIMESTAMP")]
    pub timestamp: Option<String>,
    /// Delete snapshots older than DATE (YYYYMMDD, dd.mm.yyyy or dd.mm)
    #[arg(short, long, value_name = "DATE")]
    pub before: Option<String>,
    /// Delete snapshots newer than DATE (YYYYMMDD, dd.mm.yyyy or dd.mm)
    #[arg(short, long, value_name = "DATE")]
    pub after: Option<String>,
    /// Date range START..END, e.g. 20260206..20260208
    #[arg(short = 'B', long, value_name = "RANGE")]
    pub between: Option<String>,
    /// Simulate without deleting
    #[arg(short = 'n', long = "dry-run", visible_alias = "dry")]
    pub dry_run: bool,
    /// Confirm deleting every snapshot
    #[arg(short, long)]
    pub confirm: bool,
}

impl RmArgs {
    pub fn selection(&self) -> SelectionInput {
        SelectionInput {
            timestamp: self.timestamp.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            between: self.between.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct StorageArgs {
    /// Show every snapshot of this database
    #[arg(long)]
    pub ib: Option<String>,
}
