use std::io::{self, ErrorKind};
use std::path::Path;
use std::time::Duration;

use crate::exec::{run_command, CommandSpec};
use crate::interrupt::Interrupt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl DiskUsage {
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Filesystem statistics for the volume holding `path`.
pub trait FreeSpace {
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage>;
}

/// Reads filesystem statistics from POSIX `df` output.
pub struct DfFreeSpace {
    timeout: Duration,
    interrupt: Interrupt,
}

impl DfFreeSpace {
    pub fn new(timeout: Duration, interrupt: Interrupt) -> Self {
        Self { timeout, interrupt }
    }
}

impl FreeSpace for DfFreeSpace {
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage> {
        let mut spec = CommandSpec::new("df", self.timeout);
        spec.args = vec![
            "-P".to_string(),
            "-B1".to_string(),
            path.display().to_string(),
        ];
        let outcome = run_command(&spec, &self.interrupt)
            .map_err(|e| io::Error::new(ErrorKind::Other, e))?;
        if !outcome.succeeded {
            return Err(io::Error::new(
                ErrorKind::Other,
                format!("df failed: {}", outcome.stderr.trim()),
            ));
        }
        parse_df_output(&outcome.stdout)
    }
}

fn parse_df_output(stdout: &str) -> io::Result<DiskUsage> {
    let invalid = |msg: &str| io::Error::new(ErrorKind::InvalidData, msg.to_string());

    let line = stdout
        .lines()
        .skip(1)
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| invalid("df printed no filesystem line"))?;

    // Filesystem 1-blocks Used Available Capacity Mounted-on
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return Err(invalid("df line has too few columns"));
    }
    let number = |s: &str| s.parse::<u64>().map_err(|_| invalid("non-numeric df column"));

    Ok(DiskUsage {
        total_bytes: number(fields[1])?,
        used_bytes: number(fields[2])?,
        free_bytes: number(fields[3])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_df_output() {
        let out = "Filesystem     1-blocks        Used   Available Capacity Mounted on\n\
                   /dev/vdb    107374182400 53687091200 53687091200      50% /var/backups\n";
        let usage = parse_df_output(out).unwrap();
        assert_eq!(usage.total_bytes, 107374182400);
        assert_eq!(usage.used_bytes, 53687091200);
        assert_eq!(usage.free_bytes, 53687091200);
        assert!((usage.used_percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_df_output_rejects_garbage() {
        assert!(parse_df_output("").is_err());
        assert!(parse_df_output("header\n/dev/vdb x y z 1% /").is_err());
    }
}
