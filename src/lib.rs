//! University timetable ingestion backend.
//!
//! This crate converts loosely structured, human-authored timetable
//! spreadsheets into a normalized, conflict-checked schedule and commits it
//! to durable storage. The pipeline runs in four stages:
//!
//! 1. [`parsing`] — pure parsers that turn workbook bytes into
//!    [`models::ParsedSlotEntry`] lists (cell grammar, time slots, day rows,
//!    sheet layout, lab merging).
//! 2. [`services::resolver`] — resolves section/subject/room/faculty codes
//!    against the repository, auto-creating missing records in the lenient
//!    profile.
//! 3. [`services::conflicts`] — detects room/faculty/section double
//!    bookings, capacity overruns, break-window and workload violations.
//! 4. [`services::committer`] — applies the batch inside one transaction,
//!    in replace or merge mode, with per-row duplicate accounting.
//!
//! Storage is abstracted behind the repository traits in [`db`]; the
//! default `local-repo` feature provides an in-memory implementation for
//! tests and local development.

pub mod db;
pub mod models;
pub mod parsing;
pub mod services;

pub use models::{ParsedSlotEntry, ScheduleEntry, TimeOfDay, Weekday};
pub use parsing::workbook_parser::ParseProfile;
pub use services::committer::CommitMode;
pub use services::upload::{ingest_workbook, IngestReport, UploadError, UploadOptions};
