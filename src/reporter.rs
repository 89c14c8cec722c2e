use std::cell::RefCell;
use std::time::Duration;

use backup_warden::engine::{BatchReport, OperationResult, ResultStatus};
use backup_warden::estimate::SizeEstimate;
use backup_warden::BatchReporter;
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner} {prefix:.bold.dim} {wide_msg}";
const STEADY_TICK_MS: u64 = 100;

/// Terminal output for batch progress.
#[derive(Default)]
pub struct CliReporter {
    spinner: RefCell<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_spinner(total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]);
        pb.set_style(style);
        pb.set_prefix("Estimating");
        pb.enable_steady_tick(Duration::from_millis(STEADY_TICK_MS));
        pb
    }
}

impl BatchReporter for CliReporter {
    fn on_estimate_start(&self, total: usize) {
        *self.spinner.borrow_mut() = Some(Self::new_spinner(total));
    }

    fn on_estimate(&self, database: &str, estimate: &SizeEstimate) {
        if let Some(pb) = self.spinner.borrow().as_ref() {
            pb.inc(1);
            let raw = estimate
                .raw_gb()
                .map(|gb| format!("{:.1} GB", gb))
                .unwrap_or_else(|| "size unknown".to_string());
            pb.set_message(format!(
                "{} ({}, ~{:.1} GB {})",
                database, raw, estimate.projected_gb, estimate.format
            ));
        }
    }

    fn on_estimate_complete(&self) {
        if let Some(pb) = self.spinner.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }

    fn on_item_start(&self, index: usize, total: usize, target: &str) {
        println!("{} {}", format!("[{}/{}]", index, total).dimmed(), target.bold());
    }

    fn on_item_complete(&self, index: usize, total: usize, result: &OperationResult) {
        let counter = format!("[{}/{}]", index, total).dimmed();
        match result.status {
            ResultStatus::Succeeded => {
                println!("{} ✅ {}", counter, result.target.green());
                if !result.message.is_empty() {
                    println!("      {}", result.message);
                }
            }
            ResultStatus::Blocked => {
                println!("{} ⛔ {}: {}", counter, result.target.yellow(), result.message);
            }
            ResultStatus::Interrupted => {
                println!("{} ⚠️  {}: interrupted", counter, result.target.yellow());
            }
            ResultStatus::Failed => {
                println!("{} ❌ {}: {}", counter, result.target.red(), result.message);
                if let Some(hint) = result.hint() {
                    println!("      {} {}", "hint:".cyan(), hint);
                }
            }
        }
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        println!();
        let summary = format!(
            "{}/{} succeeded in {}",
            report.succeeded_count(),
            report.total(),
            HumanDuration(report.elapsed)
        );
        if report.all_succeeded() {
            println!("{}", summary.green().bold());
        } else {
            println!("{}", summary.red().bold());
        }
        if report.interrupted {
            println!("{}", "Interrupted by user".yellow());
            if !report.skipped.is_empty() {
                println!("   Skipped: {}", report.skipped.join(", "));
            }
        }
    }
}
