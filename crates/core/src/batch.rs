use crate::aggregate::Aggregate;
use crate::encoding::TextEncoding;
use crate::error::Result;
use crate::limits::{ConcurrencyGate, ConcurrencySnapshot};
use crate::parser::SourceParser;
use crate::source::ByteSource;
use crate::stats::{BatchStats, SourceReport, SourceStatus};
use std::time::Instant;
use tokio::task::JoinSet;

/// Everything a batch run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub aggregate: Aggregate,
    /// One entry per submitted source, in submission order
    pub sources: Vec<SourceReport>,
    pub stats: BatchStats,
}

/// Reads sources with bounded concurrency and folds them into one aggregate.
///
/// Each worker parses its source into a private aggregate. Folding happens on the
/// calling task once every worker has finished, in submission order, so when two
/// sources spell a name differently the earlier source's casing is kept.
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    gate: ConcurrencyGate,
    parser: SourceParser,
}

impl BatchCoordinator {
    /// Fails only when `concurrency_limit` is zero.
    pub fn new(concurrency_limit: usize, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            gate: ConcurrencyGate::new(concurrency_limit)?,
            parser: SourceParser::new(encoding),
        })
    }

    pub fn concurrency_limit(&self) -> usize {
        self.gate.limit()
    }

    pub fn encoding(&self) -> TextEncoding {
        self.parser.encoding()
    }

    pub fn concurrency_snapshot(&self) -> ConcurrencySnapshot {
        self.gate.snapshot()
    }

    /// Process a batch and return only the final aggregate.
    pub async fn process(&self, sources: Vec<Box<dyn ByteSource>>) -> Aggregate {
        self.run(sources).await.aggregate
    }

    /// Process a batch, keeping per-source diagnostics.
    ///
    /// Unreadable or undecodable sources contribute nothing; they show up in the
    /// report instead of failing the batch.
    pub async fn run(&self, sources: Vec<Box<dyn ByteSource>>) -> BatchReport {
        let start = Instant::now();
        let total = sources.len();
        log::info!(
            "Processing {total} sources (concurrency {}, encoding {})",
            self.gate.limit(),
            self.parser.encoding()
        );

        let mut origins: Vec<String> = sources.iter().map(|s| s.origin().to_string()).collect();
        let mut workers = JoinSet::new();
        for (slot, source) in sources.into_iter().enumerate() {
            let gate = self.gate.clone();
            let parser = self.parser;
            workers.spawn(async move {
                let _permit = gate.acquire().await;
                (slot, read_and_parse(parser, source.as_ref()).await)
            });
        }

        let mut contributions: Vec<Option<(SourceReport, Aggregate)>> =
            (0..total).map(|_| None).collect();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((slot, contribution)) => contributions[slot] = Some(contribution),
                Err(e) => log::warn!("Source worker failed: {e}"),
            }
        }

        let mut report = BatchReport {
            sources: Vec::with_capacity(total),
            ..BatchReport::default()
        };
        for (slot, contribution) in contributions.into_iter().enumerate() {
            let (source_report, partial) = contribution.unwrap_or_else(|| {
                let origin = std::mem::take(&mut origins[slot]);
                (
                    SourceReport::unavailable(origin, "worker task failed"),
                    Aggregate::new(),
                )
            });
            report.stats.add_source(&source_report);
            report.aggregate.fold(partial);
            report.sources.push(source_report);
        }

        #[allow(clippy::cast_possible_truncation)]
        {
            report.stats.time_ms = start.elapsed().as_millis() as u64;
        }
        log::info!(
            "Batch completed: {} unique names from {} sources ({} failed, {} rejected lines)",
            report.aggregate.len(),
            report.stats.sources,
            report.stats.failed_sources(),
            report.stats.rejected_lines
        );
        report
    }
}

/// Run one batch with a fresh coordinator.
pub async fn process_batch(
    sources: Vec<Box<dyn ByteSource>>,
    concurrency_limit: usize,
    encoding: TextEncoding,
) -> Result<Aggregate> {
    let coordinator = BatchCoordinator::new(concurrency_limit, encoding)?;
    Ok(coordinator.process(sources).await)
}

async fn read_and_parse(
    parser: SourceParser,
    source: &dyn ByteSource,
) -> (SourceReport, Aggregate) {
    let origin = source.origin().to_string();
    let bytes = match source.read_all().await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read {origin}: {e}");
            return (
                SourceReport::unavailable(origin, e.to_string()),
                Aggregate::new(),
            );
        }
    };

    let parsed = parser.parse_source(&origin, &bytes);
    drop(bytes);

    let status = if parsed.undecodable {
        SourceStatus::Undecodable
    } else {
        SourceStatus::Parsed
    };
    let report = SourceReport {
        origin,
        status,
        lines: parsed.lines,
        records: parsed.records,
        rejected_lines: parsed.rejected,
    };
    (report, parsed.aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use crate::record::Record;
    use crate::source::MemorySource;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct FailingSource;

    #[async_trait]
    impl ByteSource for FailingSource {
        fn origin(&self) -> &str {
            "https://example.invalid/stock.txt"
        }

        async fn read_all(&self) -> Result<Vec<u8>> {
            Err(TallyError::fetch(self.origin(), "connection refused"))
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl ByteSource for PanickingSource {
        fn origin(&self) -> &str {
            "panics"
        }

        async fn read_all(&self) -> Result<Vec<u8>> {
            panic!("reader blew up")
        }
    }

    fn memory(origin: &str, text: &str) -> Box<dyn ByteSource> {
        Box::new(MemorySource::new(origin, text))
    }

    fn record(name: &str, count: i64) -> Record {
        Record::new(name, count).unwrap()
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let err = BatchCoordinator::new(0, TextEncoding::UTF_8).unwrap_err();
        assert!(matches!(err, TallyError::InvalidConcurrency(0)));

        let err = process_batch(vec![memory("a", "A, 1")], 0, TextEncoding::UTF_8)
            .await
            .unwrap_err();
        assert!(matches!(err, TallyError::InvalidConcurrency(0)));
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_aggregate() {
        let coordinator = BatchCoordinator::new(2, TextEncoding::UTF_8).unwrap();
        let report = coordinator.run(Vec::new()).await;

        assert!(report.aggregate.is_empty());
        assert!(report.sources.is_empty());
        assert_eq!(report.stats.sources, 0);
    }

    #[tokio::test]
    async fn folds_sources_in_submission_order() {
        let coordinator = BatchCoordinator::new(3, TextEncoding::UTF_8).unwrap();
        let aggregate = coordinator
            .process(vec![
                memory("first", "carrots, 1\nPeas, 2"),
                memory("second", "CARROTS, 10\nBeans, 3"),
                memory("third", "Carrots, 100"),
            ])
            .await;

        assert_eq!(
            aggregate.into_records(),
            vec![record("carrots", 111), record("Peas", 2), record("Beans", 3)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_sources_contribute_nothing() {
        let coordinator = BatchCoordinator::new(2, TextEncoding::UTF_8).unwrap();
        let report = coordinator
            .run(vec![
                memory("ok", "Apples, 7"),
                Box::new(FailingSource),
                Box::new(PanickingSource),
                memory("bad-bytes", "Apples, \u{0}"),
                Box::new(MemorySource::new("not-utf8", b"Apples, 7\n\xff".to_vec())),
            ])
            .await;

        assert_eq!(report.aggregate.into_records(), vec![record("Apples", 7)]);

        let statuses: Vec<&SourceStatus> = report.sources.iter().map(|s| &s.status).collect();
        assert_eq!(statuses[0], &SourceStatus::Parsed);
        assert!(
            matches!(statuses[1], SourceStatus::Unavailable(reason) if reason.contains("connection refused"))
        );
        assert_eq!(
            statuses[2],
            &SourceStatus::Unavailable("worker task failed".to_string())
        );
        assert_eq!(report.sources[2].origin, "panics");
        assert_eq!(statuses[3], &SourceStatus::Parsed);
        assert_eq!(statuses[4], &SourceStatus::Undecodable);

        assert_eq!(report.stats.sources, 5);
        assert_eq!(report.stats.parsed, 2);
        assert_eq!(report.stats.unavailable, 2);
        assert_eq!(report.stats.undecodable, 1);
        assert_eq!(report.stats.rejected_lines, 1);
    }
}
