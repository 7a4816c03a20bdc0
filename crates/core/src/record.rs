use serde::{Deserialize, Serialize};
use std::fmt;

/// A named quantity decoded from one `name, count` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub count: i64,
}

impl Record {
    /// Build a record from an already split name and count.
    ///
    /// The name is trimmed; `None` when nothing is left.
    pub fn new(name: &str, count: i64) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            count,
        })
    }

    /// Key used for case-insensitive identity.
    pub fn fold_key(&self) -> String {
        fold_key(&self.name)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.count)
    }
}

pub(crate) fn fold_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Why a line did not produce a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRejection {
    /// No comma in the line.
    MissingDelimiter,
    /// Nothing but whitespace before the first comma.
    EmptyName,
    /// Nothing but whitespace in the count segment.
    EmptyCount,
    /// The count segment is not a base-10 integer.
    InvalidCount,
}

impl LineRejection {
    pub const fn as_str(self) -> &'static str {
        match self {
            LineRejection::MissingDelimiter => "missing ',' delimiter",
            LineRejection::EmptyName => "empty name",
            LineRejection::EmptyCount => "empty count",
            LineRejection::InvalidCount => "count is not an integer",
        }
    }
}

impl fmt::Display for LineRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode one line of text into a [`Record`].
///
/// Only the first two comma-separated segments are looked at; anything after the
/// second comma is ignored. A comma inside the name therefore shifts the count into
/// the wrong segment and the line is rejected (`"A, B, 5"`).
pub fn decode_line(line: &str) -> std::result::Result<Record, LineRejection> {
    let mut segments = line.split(',');
    let name = segments.next().unwrap_or_default();
    let Some(count) = segments.next() else {
        return Err(LineRejection::MissingDelimiter);
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(LineRejection::EmptyName);
    }

    let count = count.trim();
    if count.is_empty() {
        return Err(LineRejection::EmptyCount);
    }
    let count = parse_count(count).ok_or(LineRejection::InvalidCount)?;

    Ok(Record {
        name: name.to_string(),
        count,
    })
}

/// Optional sign followed by ASCII digits only.
fn parse_count(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(name: &str, count: i64) -> Record {
        Record {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn decodes_plain_line() {
        assert_eq!(decode_line("Cement,10"), Ok(record("Cement", 10)));
    }

    #[test]
    fn trims_leading_whitespace_in_name() {
        assert_eq!(decode_line(" Nails,5"), Ok(record("Nails", 5)));
    }

    #[test]
    fn tolerates_stray_whitespace_around_both_segments() {
        assert_eq!(
            decode_line("Items (1 kg) , 76 "),
            Ok(record("Items (1 kg)", 76))
        );
    }

    #[test]
    fn absorbs_carriage_return() {
        assert_eq!(decode_line("Pears, 22\r"), Ok(record("Pears", 22)));
    }

    #[test]
    fn ignores_segments_after_count() {
        assert_eq!(
            decode_line("Beans, 1, dried, in bags"),
            Ok(record("Beans", 1))
        );
    }

    #[test]
    fn accepts_signed_counts() {
        assert_eq!(decode_line("Returns, -3"), Ok(record("Returns", -3)));
        assert_eq!(decode_line("Restock, +4"), Ok(record("Restock", 4)));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(decode_line(""), Err(LineRejection::MissingDelimiter));
        assert_eq!(decode_line("Abc"), Err(LineRejection::MissingDelimiter));
        assert_eq!(decode_line("Abc, "), Err(LineRejection::EmptyCount));
        assert_eq!(decode_line("Abc, a"), Err(LineRejection::InvalidCount));
        assert_eq!(decode_line("Abc,, 11"), Err(LineRejection::EmptyCount));
        assert_eq!(decode_line("   ,11"), Err(LineRejection::EmptyName));
        assert_eq!(decode_line(","), Err(LineRejection::EmptyName));
        assert_eq!(decode_line(";"), Err(LineRejection::MissingDelimiter));
    }

    #[test]
    fn comma_inside_name_rejects_line() {
        assert_eq!(decode_line("A, B, 5"), Err(LineRejection::InvalidCount));
    }

    #[test]
    fn rejects_non_decimal_counts() {
        for raw in ["Abc, 1.5", "Abc, 1e3", "Abc, 0x10", "Abc, 1 000", "Abc, -", "Abc, +"] {
            assert_eq!(decode_line(raw), Err(LineRejection::InvalidCount), "{raw}");
        }
    }

    #[test]
    fn rejects_counts_out_of_range() {
        assert_eq!(
            decode_line("Abc, 99999999999999999999"),
            Err(LineRejection::InvalidCount)
        );
    }

    #[test]
    fn record_new_trims_and_refuses_blank_names() {
        assert_eq!(Record::new("  Apples ", 2), Some(record("Apples", 2)));
        assert_eq!(Record::new(" \t ", 2), None);
    }

    #[test]
    fn fold_key_ignores_case_and_padding() {
        assert_eq!(fold_key("apples "), fold_key("APPLES"));
        assert_eq!(fold_key("Морковь"), fold_key("МОРКОВЬ"));
    }
}
