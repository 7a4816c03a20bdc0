use crate::aggregate::Aggregate;
use crate::encoding::TextEncoding;
use crate::record::{decode_line, LineRejection};

const UNNAMED_SOURCE: &str = "<buffer>";

/// Result of parsing one source buffer.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub aggregate: Aggregate,
    /// Lines seen after splitting on `\n`
    pub lines: usize,
    /// Lines that decoded into a record
    pub records: usize,
    /// Lines that did not decode
    pub rejected: usize,
    /// The buffer was not valid in the configured encoding
    pub undecodable: bool,
}

/// Decodes whole buffers and tallies their `name, count` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceParser {
    encoding: TextEncoding,
}

impl SourceParser {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Parse a buffer into its own aggregate.
    ///
    /// Never fails: an undecodable buffer yields an empty aggregate and malformed
    /// lines are skipped.
    pub fn parse(&self, bytes: &[u8]) -> Aggregate {
        self.parse_source(UNNAMED_SOURCE, bytes).aggregate
    }

    /// Like [`parse`](Self::parse), keeping line statistics. `origin` only labels log output.
    pub fn parse_source(&self, origin: &str, bytes: &[u8]) -> ParsedSource {
        let mut parsed = ParsedSource::default();

        let Some(text) = self.encoding.decode(bytes) else {
            log::warn!(
                "Skipping {origin}: content is not valid {} ({} bytes)",
                self.encoding,
                bytes.len()
            );
            parsed.undecodable = true;
            return parsed;
        };

        for (number, line) in text.split('\n').enumerate() {
            parsed.lines += 1;
            match decode_line(line) {
                Ok(record) => {
                    parsed.records += 1;
                    parsed.aggregate.merge(record);
                }
                Err(rejection) => {
                    parsed.rejected += 1;
                    report_rejection(origin, number + 1, line, rejection);
                }
            }
        }

        log::debug!(
            "Parsed {origin}: {} lines, {} records, {} rejected, {} unique names",
            parsed.lines,
            parsed.records,
            parsed.rejected,
            parsed.aggregate.len()
        );
        parsed
    }
}

fn report_rejection(origin: &str, line_no: usize, line: &str, rejection: LineRejection) {
    if line.trim().is_empty() {
        log::debug!("{origin}:{line_no}: skipping blank line");
        return;
    }
    log::warn!("{origin}:{line_no}: malformed line ({rejection}): {line:?}");
}
