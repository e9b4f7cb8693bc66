//! Storage module for schedule and reference-entity data.
//!
//! This module provides abstractions for storage operations via the
//! Repository pattern, allowing different backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (upload flow, REST API, etc.)        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services/) - Business Logic             │
//! │  - Entity resolution and auto-creation                  │
//! │  - Conflict detection                                   │
//! │  - Transactional commit                                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository.rs) - Abstract Interface │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                 │
//!     │               (in-memory)                    │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The natural-key uniqueness invariant — no two schedule entries for one
//! section at the same `(day, start_time)` — is enforced by every backend,
//! and every write issued during a commit is bound to the repository's
//! transaction scope so readers never observe a half-replaced section.

#[cfg(not(any(feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::{IngestSettings, RepositoryConfig};
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
pub use repository::{
    FullRepository, ReferenceRepository, RepositoryError, RepositoryResult, ScheduleRepository,
    TransactionScope,
};
