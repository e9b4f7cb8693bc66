//! Pipeline stages over the parsed workbook.
//!
//! Parsing (in [`crate::parsing`]) is pure; the services here are the
//! effectful stages that follow it:
//!
//! - [`resolver`]: resolve or auto-create the reference entities a batch
//!   refers to
//! - [`conflicts`]: detect scheduling conflicts in a candidate batch
//! - [`committer`]: apply a validated batch inside one transaction
//! - [`upload`]: the end-to-end ingestion flow tying the stages together
//! - [`template`]: generate the downloadable sample workbook

pub mod committer;
pub mod conflicts;
pub mod resolver;
pub mod template;
pub mod upload;

pub use committer::{commit_entries, CommitMode, CommitStats};
pub use conflicts::{detect_conflicts, Conflict, ConflictContext, ConflictKind, Severity};
pub use resolver::{resolve_entities, ResolutionOutcome, ResolveError};
pub use upload::{create_entry, ingest_workbook, IngestReport, UploadError, UploadOptions};
