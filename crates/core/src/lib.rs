//! # Tally Core
//!
//! Turns batches of `name, count` text documents into one case-insensitive tally.
//!
//! ## Pipeline
//!
//! ```text
//! Sources (files, uploads, URLs)
//!     │
//!     ├──> Batch Coordinator (bounded concurrency)
//!     │      └─> one worker per source: read bytes
//!     │
//!     ├──> Source Parser (per worker)
//!     │      ├─> decode with the configured encoding
//!     │      ├─> split on '\n'
//!     │      └─> decode each line into a Record, merge into a private Aggregate
//!     │
//!     └──> Fold (coordinator task, submission order)
//!            └─> final Aggregate
//! ```
//!
//! Bad data never fails a batch: malformed lines are skipped, undecodable buffers and
//! unreadable sources contribute nothing. Each of those is logged at warning level.
//!
//! ## Example
//!
//! ```no_run
//! use tally_core::{BatchCoordinator, ByteSource, FileSource, TextEncoding};
//!
//! #[tokio::main]
//! async fn main() -> tally_core::Result<()> {
//!     let coordinator = BatchCoordinator::new(4, TextEncoding::UTF_8)?;
//!     let sources: Vec<Box<dyn ByteSource>> = vec![
//!         Box::new(FileSource::new("north.txt")),
//!         Box::new(FileSource::new("south.txt")),
//!     ];
//!     let report = coordinator.run(sources).await;
//!
//!     for item in &report.aggregate {
//!         println!("{}: {}", item.name, item.count);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregate;
mod batch;
mod encoding;
mod error;
mod limits;
mod parser;
mod record;
mod source;
mod stats;

pub use aggregate::Aggregate;
pub use batch::{process_batch, BatchCoordinator, BatchReport};
pub use encoding::TextEncoding;
pub use error::{Result, TallyError};
pub use limits::{default_concurrency, parse_concurrency, ConcurrencySnapshot};
pub use parser::{ParsedSource, SourceParser};
pub use record::{decode_line, LineRejection, Record};
pub use source::{ByteSource, FileSource, MemorySource};
pub use stats::{BatchStats, SourceReport, SourceStatus};
