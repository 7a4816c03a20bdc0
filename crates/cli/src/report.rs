use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt::Write as _;
use tally_core::{BatchReport, BatchStats, Record, SourceReport, SourceStatus};

/// Display order for rendered items. The aggregate itself stays in insertion order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    #[default]
    Insertion,
    Name,
    Count,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    items: Vec<&'a Record>,
    stats: &'a BatchStats,
    sources: &'a [SourceReport],
}

fn ordered(report: &BatchReport, order: SortOrder) -> Vec<&Record> {
    let mut items: Vec<&Record> = report.aggregate.iter().collect();
    match order {
        SortOrder::Insertion => {}
        SortOrder::Name => items.sort_by_cached_key(|r| (r.name.to_lowercase(), r.name.clone())),
        SortOrder::Count => items.sort_by_key(|r| Reverse(r.count)),
    }
    items
}

pub fn render_json(report: &BatchReport, order: SortOrder, pretty: bool) -> Result<String> {
    let payload = JsonReport {
        items: ordered(report, order),
        stats: &report.stats,
        sources: &report.sources,
    };
    let text = if pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    Ok(text)
}

pub fn render_text(report: &BatchReport, order: SortOrder) -> String {
    let items = ordered(report, order);
    let name_width = items
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("name".len());

    let mut out = String::new();
    if items.is_empty() {
        out.push_str("No records found.\n");
    } else {
        let _ = writeln!(out, "{:<name_width$}  count", "name");
        for item in &items {
            let pad = name_width - item.name.chars().count();
            let _ = writeln!(out, "{}{}  {}", item.name, " ".repeat(pad), item.count);
        }
    }

    let stats = &report.stats;
    let _ = writeln!(
        out,
        "\n{} names, total {} from {}/{} sources ({} lines, {} rejected)",
        report.aggregate.len(),
        report.aggregate.total(),
        stats.parsed,
        stats.sources,
        stats.lines,
        stats.rejected_lines
    );
    for source in &report.sources {
        match &source.status {
            SourceStatus::Parsed => {}
            SourceStatus::Undecodable => {
                let _ = writeln!(
                    out,
                    "  skipped {}: not valid text in the chosen encoding",
                    source.origin
                );
            }
            SourceStatus::Unavailable(reason) => {
                let _ = writeln!(out, "  skipped {}: {reason}", source.origin);
            }
        }
    }
    out
}
