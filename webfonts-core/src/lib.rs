//! # webfonts-core
//!
//! Data model for the webfonts engine: the font [`Repository`] mapping
//! languages to families and families to loadable [`FontConfig`]s.
//!
//! Repositories are immutable values. Caller entries are layered on top of a
//! default repository with the pure [`merge`] function, so any number of
//! sessions can share one `Arc<Repository>` without coordination.

pub mod repository;

pub use repository::{
    merge, FontConfig, FontFormat, Repository, RepositoryError, DEFAULT_BASE,
};
