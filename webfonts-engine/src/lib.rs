//! # webfonts-engine
//!
//! Resolves, loads and applies web fonts to regions of a document tree
//! according to each region's language.
//!
//! ## Architecture
//!
//! ```text
//! WebFonts::attach(env, root, options)            (session per root)
//!     │
//!     ├── apply(default family of root language)
//!     │
//!     ▼
//! scanner::scan ──► explicit font-family? ──► LoadCache::ensure_loaded
//!     │                                            │
//!     └──► lang differs from context? ──► apply    ▼
//!                                           synthesize ──► StyleRule
//!                                                  │
//!                                                  ▼
//!                                   Environment::insert_style (once per family)
//! ```
//!
//! - **`environment`** — Host capabilities (`Environment` trait, `NodeQuery`).
//! - **`dom`** — In-memory `Environment` used by tests and the demo.
//! - **`synthesizer`** — Pure `@font-face` rule generation.
//! - **`loader`** — Per-session de-duplication of rule insertion.
//! - **`scanner`** — Single-pass override discovery.
//! - **`webfonts`** — The session: attach / apply / reset / list / detach.

pub mod dom;
pub mod environment;
pub mod loader;
pub mod scanner;
pub mod style;
pub mod synthesizer;
pub mod webfonts;

// Re-exports for ergonomic use.
pub use dom::{DocumentError, Element, MemoryDocument};
pub use environment::{Environment, NodeQuery};
pub use loader::LoadCache;
pub use scanner::{FontSink, ScanReport};
pub use synthesizer::{synthesize, StyleRule, SynthesisContext, DEFAULT_CACHE_SALT};
pub use webfonts::{WebFonts, WebFontsOptions};
pub use webfonts_core::{FontConfig, FontFormat, Repository};
