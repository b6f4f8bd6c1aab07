use std::fmt;
use std::path::PathBuf;

use crate::errors::Error;

/// The result of one series' fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The output file was rewritten; holds the path for the run log.
    Updated(PathBuf),
    /// The merged dataset was identical to what's on disk; nothing written.
    Unchanged,
    /// Fetch or write failed; the previous output file is untouched.
    Failed(Error),
}

/// Per-series outcomes of one fetch run, in input order.
#[derive(Debug, Default)]
pub struct FetchReport {
    entries: Vec<(String, FetchOutcome)>,
}

impl FetchReport {
    pub fn push(&mut self, symbol: &str, outcome: FetchOutcome) {
        self.entries.push((symbol.to_string(), outcome));
    }

    pub fn entries(&self) -> &[(String, FetchOutcome)] {
        &self.entries
    }

    pub fn outcome_for(&self, symbol: &str) -> Option<&FetchOutcome> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, o)| o)
    }

    pub fn updated_count(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Updated(_)))
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Unchanged))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Failed(_)))
    }

    /// True when the run produced nothing at all. The process only exits
    /// non-zero for a fetch run in this case.
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.failed_count() == self.entries.len()
    }

    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| pred(o)).count()
    }
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Fetch Results ===")?;
        for (symbol, outcome) in &self.entries {
            match outcome {
                FetchOutcome::Updated(path) => {
                    writeln!(f, "{symbol}: updated ({})", path.display())?
                }
                FetchOutcome::Unchanged => writeln!(f, "{symbol}: unchanged")?,
                FetchOutcome::Failed(e) => writeln!(f, "{symbol}: failed - {e}")?,
            }
        }
        write!(
            f,
            "Completed: {} updated, {} unchanged, {} failed ({} series)",
            self.updated_count(),
            self.unchanged_count(),
            self.failed_count(),
            self.entries.len()
        )
    }
}
