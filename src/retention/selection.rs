use super::dates::{normalize_date, normalize_timestamp};
use super::SelectionError;

/// Which snapshots of a database a deletion applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSpec {
    Exact(String),
    Before(String),
    After(String),
    Range { after: String, before: String },
    Unrestricted,
}

/// Raw deletion criteria as the operator typed them.
#[derive(Debug, Clone, Default)]
pub struct SelectionInput {
    pub timestamp: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    /// `START..END`
    pub between: Option<String>,
}

impl SelectionInput {
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
            && self.before.is_none()
            && self.after.is_none()
            && self.between.is_none()
    }
}

impl SelectionSpec {
    /// Validates and normalizes raw criteria. All rejection happens here, before
    /// the filter engine or any external call sees the selection.
    pub fn from_parts(input: &SelectionInput, current_year: i32) -> Result<Self, SelectionError> {
        let has_bound =
            input.before.is_some() || input.after.is_some() || input.between.is_some();

        if let Some(ts) = &input.timestamp {
            if has_bound {
                return Err(SelectionError::Conflict(
                    "--at cannot be combined with --before, --after or --between".to_string(),
                ));
            }
            return Ok(SelectionSpec::Exact(normalize_timestamp(ts)?));
        }

        let (after, before) = match &input.between {
            Some(range) => {
                if input.before.is_some() || input.after.is_some() {
                    return Err(SelectionError::Conflict(
                        "--between cannot be combined with --before or --after".to_string(),
                    ));
                }
                let (start, end) = range
                    .split_once("..")
                    .ok_or_else(|| SelectionError::InvalidRange(range.clone()))?;
                (Some(start.trim().to_string()), Some(end.trim().to_string()))
            }
            None => (input.after.clone(), input.before.clone()),
        };

        let after = after
            .map(|d| normalize_date(&d, current_year))
            .transpose()?;
        let before = before
            .map(|d| normalize_date(&d, current_year))
            .transpose()?;

        Ok(match (after, before) {
            (Some(after), Some(before)) => SelectionSpec::Range { after, before },
            (Some(after), None) => SelectionSpec::After(after),
            (None, Some(before)) => SelectionSpec::Before(before),
            (None, None) => SelectionSpec::Unrestricted,
        })
    }

    /// Bounded selections cannot match every snapshot by construction.
    pub fn is_bounded(&self) -> bool {
        !matches!(self, SelectionSpec::Unrestricted)
    }

    /// Filter flags understood by the rm engine.
    pub fn engine_args(&self) -> Vec<String> {
        let pair = |flag: &str, value: &str| vec![flag.to_string(), value.to_string()];
        match self {
            SelectionSpec::Exact(ts) => pair("--timestamp", ts),
            SelectionSpec::Before(d) => pair("--before", d),
            SelectionSpec::After(d) => pair("--after", d),
            SelectionSpec::Range { after, before } => {
                let mut args = pair("--after", after);
                args.extend(pair("--before", before));
                args
            }
            SelectionSpec::Unrestricted => Vec::new(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SelectionSpec::Exact(ts) => format!("snapshot {}", ts),
            SelectionSpec::Before(d) => format!("snapshots before {}", d),
            SelectionSpec::After(d) => format!("snapshots after {}", d),
            SelectionSpec::Range { after, before } => {
                format!("snapshots between {} and {}", after, before)
            }
            SelectionSpec::Unrestricted => "ALL snapshots".to_string(),
        }
    }
}
