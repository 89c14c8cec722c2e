mod cli;
mod logging;
mod reporter;

use std::process;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use backup_warden::config::{load_configuration, AppConfig};
use backup_warden::estimate::{BackupFormat, PsqlSizeProbe, SizeEstimator};
use backup_warden::exec::ScriptExecutor;
use backup_warden::preflight::{CapacityPreflight, CapacityReport, DfFreeSpace, FreeSpace};
use backup_warden::registry::DatabaseRegistry;
use backup_warden::retention::dates::{current_year, machine_to_human};
use backup_warden::retention::SelectionSpec;
use backup_warden::storage::{format_age, format_size, SnapshotStore};
use backup_warden::{BackupOrchestrator, BatchReporter, DeletionOrchestrator, Interrupt};
use chrono::Local;
use clap::{CommandFactory, Parser};
use cli::{BackupArgs, Cli, Commands, PreflightArgs, RmArgs, StorageArgs, Targets};
use colored::*;
use dotenv::dotenv;
use reporter::CliReporter;
use tracing::{debug, error, info};

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();

    let code = match run(args) {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            1
        }
    };

    // process::exit skips destructors; flush the file log first.
    drop(guard);
    process::exit(code);
}

fn run(args: Cli) -> Result<i32> {
    let Some(command) = args.command else {
        Cli::command().print_help()?;
        return Ok(0);
    };

    let config = load_configuration().context("Error loading configuration")?;
    debug!("config: {:?}", config);

    let interrupt = Interrupt::new();
    interrupt
        .install_handler()
        .context("Error installing the Ctrl-C handler")?;

    match command {
        Commands::Backup(args) => run_backup(&config, &args, interrupt),
        Commands::Preflight(args) => run_preflight(&config, &args, interrupt),
        Commands::Rm(args) => run_rm(&config, &args, interrupt),
        Commands::Storage(args) => run_storage(&config, &args, interrupt),
        Commands::PrintConfig => {
            let rendered = toml::to_string_pretty(&config).context("Error rendering configuration")?;
            println!("{}", rendered);
            Ok(0)
        }
    }
}

/// Explicit `--ib` names, or every eligible registry entry for `--all`.
fn resolve_targets(config: &AppConfig, targets: &Targets) -> Result<Vec<String>> {
    if !targets.all {
        return Ok(targets.ib.clone());
    }
    let registry = DatabaseRegistry::load(&config.paths.ib_list)
        .with_context(|| format!("Error reading {}", config.paths.ib_list.display()))?;
    let names = registry.eligible(&config.reserved_names);
    if names.is_empty() {
        bail!("No databases listed in {}", config.paths.ib_list.display());
    }
    info!("{} database(s) from {}", names.len(), config.paths.ib_list.display());
    Ok(names)
}

fn capacity_report(
    config: &AppConfig,
    names: &[String],
    format: BackupFormat,
    margin_gb: f64,
    interrupt: &Interrupt,
    reporter: &CliReporter,
) -> CapacityReport {
    let estimator = SizeEstimator::new(config.estimates.clone());
    let probe = PsqlSizeProbe::new(config, interrupt.clone());
    let free_space = DfFreeSpace::new(
        Duration::from_secs(config.timeouts.free_space_secs),
        interrupt.clone(),
    );
    let preflight = CapacityPreflight::new(&estimator, &probe, &free_space, &config.paths.backup_root);

    reporter.on_estimate_start(names.len());
    let report = preflight.check_with(names, format, margin_gb, |db, estimate| {
        reporter.on_estimate(db, estimate)
    });
    reporter.on_estimate_complete();
    report
}

fn print_capacity(report: &CapacityReport) {
    for (name, estimate) in &report.breakdown {
        let raw = estimate
            .raw_gb()
            .map(|gb| format!("{:>7.2} GB", gb))
            .unwrap_or_else(|| format!("{:>10}", "unknown"));
        println!("   {:<30} {} -> ~{:.2} GB", name, raw, estimate.projected_gb);
    }
    let text = report.to_string();
    if report.sufficient {
        println!("{} {}", "✅".green(), text);
    } else {
        println!("{} {}", "❌".red(), text.red());
    }
}

fn run_backup(config: &AppConfig, args: &BackupArgs, interrupt: Interrupt) -> Result<i32> {
    let names = resolve_targets(config, &args.targets)?;
    let reporter = CliReporter::new();

    if !args.dry_run && !args.skip_preflight {
        let report = capacity_report(
            config,
            &names,
            args.format,
            config.preflight.safety_margin_gb,
            &interrupt,
            &reporter,
        );
        print_capacity(&report);
        if interrupt.is_triggered() {
            return Ok(130);
        }
        if !report.sufficient {
            println!("{}", "Backup aborted: free up space or pass --skip-preflight".red());
            return Ok(1);
        }
        println!();
    }

    let executor = ScriptExecutor::new(interrupt.clone());
    let probe = PsqlSizeProbe::new(config, interrupt.clone());
    let orchestrator = BackupOrchestrator::new(config, &executor, &probe, &reporter, interrupt);
    let report = orchestrator.run(&names, args.format, args.dry_run);
    Ok(report.exit_code())
}

fn run_preflight(config: &AppConfig, args: &PreflightArgs, interrupt: Interrupt) -> Result<i32> {
    let names = resolve_targets(config, &args.targets)?;
    let margin = args.margin.unwrap_or(config.preflight.safety_margin_gb);
    let reporter = CliReporter::new();
    let report = capacity_report(config, &names, args.format, margin, &interrupt, &reporter);
    print_capacity(&report);
    if interrupt.is_triggered() {
        return Ok(130);
    }
    Ok(if report.sufficient { 0 } else { 1 })
}

fn run_rm(config: &AppConfig, args: &RmArgs, interrupt: Interrupt) -> Result<i32> {
    let selection = args.selection();
    let executor = ScriptExecutor::new(interrupt.clone());
    let store = SnapshotStore::new(&config.paths.backup_root);
    let reporter = CliReporter::new();
    let orchestrator = DeletionOrchestrator::new(config, &executor, &store, &reporter, interrupt);

    if args.targets.all {
        if !selection.is_empty() {
            bail!("--all deletes every snapshot and cannot be combined with --at/--before/--after/--between");
        }
        let report = orchestrator.run_all(args.dry_run, args.confirm);
        return Ok(report.exit_code());
    }

    let spec = SelectionSpec::from_parts(&selection, current_year())?;
    let report = orchestrator.run(&args.targets.ib, &spec, args.dry_run, args.confirm);
    Ok(report.exit_code())
}

fn run_storage(config: &AppConfig, args: &StorageArgs, interrupt: Interrupt) -> Result<i32> {
    let store = SnapshotStore::new(&config.paths.backup_root);
    let now = Local::now().naive_local();

    let free_space = DfFreeSpace::new(Duration::from_secs(config.timeouts.free_space_secs), interrupt);
    match free_space.disk_usage(store.root()) {
        Ok(usage) => println!(
            "{} {}: {} free, {} used of {} ({:.0}%)",
            "Storage".bold(),
            store.root().display(),
            format_size(usage.free_bytes),
            format_size(usage.used_bytes),
            format_size(usage.total_bytes),
            usage.used_percent()
        ),
        Err(e) => println!("{} {}: {}", "Storage".bold(), store.root().display(), e),
    }
    println!();

    if let Some(name) = &args.ib {
        if !store.has_database(name) {
            println!("{}", format!("No backups for '{}'", name).red());
            return Ok(1);
        }
        let snapshots = store.snapshots(name);
        println!("{} ({} snapshot(s))", name.bold(), snapshots.len());
        for snapshot in &snapshots {
            println!(
                "   {}  {:>8}  {}  {}",
                snapshot.timestamp,
                format_size(snapshot.size_bytes),
                machine_to_human(&snapshot.timestamp),
                format_age(&snapshot.timestamp, now).dimmed()
            );
        }
        return Ok(0);
    }

    let databases = store
        .databases()
        .with_context(|| format!("Error listing {}", store.root().display()))?;
    if databases.is_empty() {
        println!("No backups under {}", store.root().display());
        return Ok(0);
    }
    for name in &databases {
        let summary = store.summary(name);
        let latest = summary
            .latest
            .as_ref()
            .map(|s| {
                format!(
                    "{} ({}, {})",
                    machine_to_human(&s.timestamp),
                    format_size(s.size_bytes),
                    format_age(&s.timestamp, now)
                )
            })
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<30} {:>3} snapshot(s)  {:>8}  latest {}",
            summary.name,
            summary.snapshot_count,
            format_size(summary.total_bytes),
            latest
        );
    }
    Ok(0)
}
