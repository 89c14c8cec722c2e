use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;
use crate::estimate::BackupFormat;

static DEFAULT_CONFIG_NAME: &str = "Config";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub timeouts: TimeoutConfig,
    pub estimates: EstimateConfig,
    pub preflight: PreflightConfig,
    pub psql: PsqlConfig,
    /// Registry names never picked up by `--all`.
    pub reserved_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub backup_root: PathBuf,
    pub scripts_dir: PathBuf,
    pub ib_list: PathBuf,
    pub backup_user: String,
    pub backup_script: String,
    pub rm_script: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub minutes_per_gb: f64,
    pub minimum_secs: u64,
    pub dry_run_secs: u64,
    pub probe_secs: u64,
    pub free_space_secs: u64,
    pub delete_secs: u64,
    pub delete_all_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateConfig {
    pub dump_coefficient: f64,
    pub sql_coefficient: f64,
}

impl EstimateConfig {
    pub fn coefficient(&self, format: BackupFormat) -> f64 {
        match format {
            BackupFormat::Compact => self.dump_coefficient,
            BackupFormat::TextCompressed => self.sql_coefficient,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightConfig {
    pub safety_margin_gb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsqlConfig {
    pub binary: PathBuf,
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                backup_root: PathBuf::from("/var/backups/1c"),
                scripts_dir: PathBuf::from("/opt/1cv8/scripts"),
                ib_list: PathBuf::from("/opt/1cv8/scripts/ib_list.conf"),
                backup_user: "usr1cv8".to_string(),
                backup_script: "backup/engines/backup.sh".to_string(),
                rm_script: "rm/engines/rm.sh".to_string(),
            },
            timeouts: TimeoutConfig {
                minutes_per_gb: 5.0,
                minimum_secs: 600,
                dry_run_secs: 300,
                probe_secs: 10,
                free_space_secs: 10,
                delete_secs: 300,
                delete_all_secs: 600,
            },
            estimates: EstimateConfig {
                dump_coefficient: 0.45,
                sql_coefficient: 0.25,
            },
            preflight: PreflightConfig {
                safety_margin_gb: 0.5,
            },
            psql: PsqlConfig {
                binary: PathBuf::from("/usr/lib/postgresql/15/bin/psql"),
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
            },
            reserved_names: vec![
                "all".to_string(),
                "test_ib".to_string(),
                "tst_db".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Path the orchestrators hand to the executor for a given engine script.
    pub fn script_path(&self, relative: &str) -> PathBuf {
        self.paths.scripts_dir.join(relative)
    }
}

/// Layers built-in defaults, an optional config file and `BACKUP_WARDEN__*`
/// environment overrides, in that order.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let file_name =
        env::var("BACKUP_WARDEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());
    load_from(&file_name)
}

fn load_from(file_name: &str) -> Result<AppConfig, Error> {
    let defaults = Config::try_from(&AppConfig::default())?;

    let builder = Config::builder()
        .add_source(defaults)
        .add_source(ConfigFile::with_name(file_name).required(false))
        .add_source(
            Environment::with_prefix("BACKUP_WARDEN")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("reserved_names")
                .try_parsing(true),
        )
        .build()?;

    Ok(builder.try_deserialize::<AppConfig>()?)
}
