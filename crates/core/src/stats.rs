use serde::{Deserialize, Serialize};

/// Outcome of one source within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SourceStatus {
    Parsed,
    Undecodable,
    Unavailable(String),
}

/// Per-source diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub origin: String,
    #[serde(flatten)]
    pub status: SourceStatus,
    pub lines: usize,
    pub records: usize,
    pub rejected_lines: usize,
}

impl SourceReport {
    pub(crate) fn unavailable(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            status: SourceStatus::Unavailable(reason.into()),
            lines: 0,
            records: 0,
            rejected_lines: 0,
        }
    }
}

/// Statistics about a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of sources submitted
    pub sources: usize,

    /// Sources that were read and decoded
    pub parsed: usize,

    /// Sources whose bytes were not valid in the configured encoding
    pub undecodable: usize,

    /// Sources that could not be read or fetched
    pub unavailable: usize,

    /// Total lines seen
    pub lines: usize,

    /// Lines that produced a record
    pub records: usize,

    /// Lines skipped as malformed
    pub rejected_lines: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, report: &SourceReport) {
        self.sources += 1;
        match report.status {
            SourceStatus::Parsed => self.parsed += 1,
            SourceStatus::Undecodable => self.undecodable += 1,
            SourceStatus::Unavailable(_) => self.unavailable += 1,
        }
        self.lines += report.lines;
        self.records += report.records;
        self.rejected_lines += report.rejected_lines;
    }

    /// Sources that contributed nothing because of a problem.
    pub fn failed_sources(&self) -> usize {
        self.undecodable + self.unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(lines: usize, records: usize) -> SourceReport {
        SourceReport {
            origin: "a.txt".to_string(),
            status: SourceStatus::Parsed,
            lines,
            records,
            rejected_lines: lines - records,
        }
    }

    #[test]
    fn accumulates_source_reports() {
        let mut stats = BatchStats::new();
        stats.add_source(&parsed(4, 3));
        stats.add_source(&parsed(2, 2));
        stats.add_source(&SourceReport::unavailable("http://x", "timeout"));
        stats.add_source(&SourceReport {
            status: SourceStatus::Undecodable,
            ..parsed(0, 0)
        });

        assert_eq!(
            stats,
            BatchStats {
                sources: 4,
                parsed: 2,
                undecodable: 1,
                unavailable: 1,
                lines: 6,
                records: 5,
                rejected_lines: 1,
                time_ms: 0,
            }
        );
        assert_eq!(stats.failed_sources(), 2);
    }

    #[test]
    fn source_report_serializes_status_inline() {
        let json = serde_json::to_value(SourceReport::unavailable("http://x", "404")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "origin": "http://x",
                "status": "unavailable",
                "reason": "404",
                "lines": 0,
                "records": 0,
                "rejected_lines": 0,
            })
        );

        let json = serde_json::to_value(parsed(1, 1)).unwrap();
        assert_eq!(json["status"], "parsed");
        assert!(json.get("reason").is_none());
    }
}
