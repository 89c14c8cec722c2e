use std::time::Duration;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::exec::OperationOutcome;
use crate::config::AppConfig;
use crate::exec::{run_command, CommandSpec};
use crate::interrupt::Interrupt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Bytes(u64),
    NotFound,
    Failed(String),
}

impl ProbeResult {
    pub fn bytes(&self) -> Option<u64> {
        match self {
            ProbeResult::Bytes(b) => Some(*b),
            _ => None,
        }
    }
}

/// Read-only lookup of a database's on-disk size. Exactly one attempt per call.
pub trait SizeProbe {
    fn probe(&self, database: &str) -> ProbeResult;
}

/// Asks PostgreSQL for `pg_database_size` through `psql`, as the backup user.
pub struct PsqlSizeProbe {
    spec: CommandSpec,
    interrupt: Interrupt,
}

impl PsqlSizeProbe {
    pub fn new(config: &AppConfig, interrupt: Interrupt) -> Self {
        let user = &config.paths.backup_user;
        let mut spec = CommandSpec::new(
            &config.psql.binary,
            Duration::from_secs(config.timeouts.probe_secs),
        );
        spec.run_as = Some(user.clone());
        spec.set_home = true;
        spec.env = vec![(
            "PGPASSFILE".to_string(),
            format!("/home/{}/.pgpass", user),
        )];
        spec.args = vec![
            "-h".to_string(),
            config.psql.host.clone(),
            "-p".to_string(),
            config.psql.port.to_string(),
            "-U".to_string(),
            config.psql.user.clone(),
        ];
        Self { spec, interrupt }
    }

    fn command_for(&self, database: &str) -> CommandSpec {
        let mut spec = self.spec.clone();
        spec.args.extend([
            "-d".to_string(),
            database.to_string(),
            "-tAc".to_string(),
            format!("SELECT pg_database_size({})", quote_literal(database)),
        ]);
        spec
    }
}

impl SizeProbe for PsqlSizeProbe {
    fn probe(&self, database: &str) -> ProbeResult {
        let outcome = match run_command(&self.command_for(database), &self.interrupt) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Size probe for '{}' did not complete: {}", database, e);
                return ProbeResult::Failed(e.to_string());
            }
        };

        if !outcome.succeeded {
            if reports_missing_database(&outcome, database) {
                return ProbeResult::NotFound;
            }
            let classification = classify(&outcome);
            warn!(
                "Size probe for '{}' failed ({}): {}",
                database, classification.category, classification.message
            );
            return ProbeResult::Failed(classification.message);
        }

        match parse_size(&outcome.stdout) {
            Some(bytes) => {
                debug!("Database '{}' is {} bytes", database, bytes);
                ProbeResult::Bytes(bytes)
            }
            None => ProbeResult::Failed(format!(
                "unexpected psql output: '{}'",
                outcome.stdout.trim()
            )),
        }
    }
}

/// True only for the server saying this very database is absent. A missing
/// psql binary, role or certificate is a probe failure, not a missing database.
fn reports_missing_database(outcome: &OperationOutcome, database: &str) -> bool {
    let name = database.to_lowercase();
    let phrases = [
        format!("database \"{}\" does not exist", name),
        format!("база данных \"{}\" не существует", name),
    ];
    [&outcome.stderr, &outcome.stdout].iter().any(|text| {
        let text = text.to_lowercase();
        phrases.iter().any(|phrase| text.contains(phrase.as_str()))
    })
}

fn parse_size(stdout: &str) -> Option<u64> {
    let cleaned: String = stdout
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("12345\n"), Some(12345));
        assert_eq!(parse_size(" 1,234,567 "), Some(1234567));
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("-1"), None);
        assert_eq!(parse_size("ERROR"), None);
    }

    #[test]
    fn test_quote_literal_escapes_quotes() {
        assert_eq!(quote_literal("db1"), "'db1'");
        assert_eq!(quote_literal("o'neil"), "'o''neil'");
    }

    #[test]
    fn test_command_for_database() {
        let probe = PsqlSizeProbe::new(&AppConfig::default(), Interrupt::new());
        let spec = probe.command_for("artel_2025");
        assert_eq!(spec.run_as.as_deref(), Some("usr1cv8"));
        assert!(spec.set_home);
        assert_eq!(spec.timeout, Duration::from_secs(10));
        assert_eq!(
            spec.args.last().map(String::as_str),
            Some("SELECT pg_database_size('artel_2025')")
        );
        assert!(spec
            .env
            .iter()
            .any(|(k, v)| k == "PGPASSFILE" && v == "/home/usr1cv8/.pgpass"));
    }

    /// A probe whose psql is an inline shell script, run without sudo.
    #[cfg(unix)]
    fn scripted_probe(script: &str) -> PsqlSizeProbe {
        let mut probe = PsqlSizeProbe::new(&AppConfig::default(), Interrupt::new());
        probe.spec.program = std::path::PathBuf::from("/bin/sh");
        probe.spec.args = vec!["-c".to_string(), script.to_string(), "psql".to_string()];
        probe.spec.run_as = None;
        probe.spec.set_home = false;
        probe
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_database_diagnostic() {
        let probe = scripted_probe(
            r#"echo 'psql: error: connection to server on socket "/var/run/postgresql/.s.PGSQL.5432" failed: FATAL:  database "ghost" does not exist' >&2; exit 2"#,
        );
        assert_eq!(probe.probe("ghost"), ProbeResult::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_database_diagnostic_russian() {
        let probe = scripted_probe(
            r#"echo 'psql: ошибка: ВАЖНО:  база данных "ghost" не существует' >&2; exit 2"#,
        );
        assert_eq!(probe.probe("ghost"), ProbeResult::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_other_failures_are_not_missing_database() {
        let diagnostics = [
            r#"FATAL:  role "postgres" does not exist"#,
            "sudo: /usr/lib/postgresql/15/bin/psql: command not found",
            r#"psql: error: could not open certificate file "/root/.postgresql/postgresql.crt": No such file or directory"#,
            r#"FATAL:  database "other" does not exist"#,
        ];
        for diagnostic in diagnostics {
            let probe = scripted_probe(&format!("echo '{}' >&2; exit 2", diagnostic));
            match probe.probe("ghost") {
                ProbeResult::Failed(message) => assert_eq!(message, diagnostic),
                other => panic!("{:?} for '{}'", other, diagnostic),
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_size_from_stdout() {
        let probe = scripted_probe("echo ' 1234567'");
        assert_eq!(probe.probe("db1"), ProbeResult::Bytes(1234567));
    }

    #[cfg(unix)]
    #[test]
    fn test_unexpected_stdout_is_failure() {
        let probe = scripted_probe("echo 'Pager usage is off.'");
        assert!(matches!(probe.probe("db1"), ProbeResult::Failed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_psql_binary_is_failure() {
        let mut probe = scripted_probe("");
        probe.spec.program = std::path::PathBuf::from("/nonexistent/psql");
        assert!(matches!(probe.probe("db1"), ProbeResult::Failed(_)));
    }
}
