//! # webfonts-prefs — user preference persistence
//!
//! Key/value preferences shared by the language and font selection
//! components.
//!
//! ```text
//!                 Preferences<B>
//!                  get / set / save
//!                        │
//!          ┌─────────────┴──────────────┐
//!          ▼                            ▼
//!   LocalBackend<S>              RemoteBackend<A>
//!   (anonymous identity)         (named identity)
//!          │                            │
//!          ▼                            ▼
//!   LocalStore (file, memory)    OptionsClient ── TokenState { NoToken, Cached }
//!                                       │
//!                                       ▼
//!                                  OptionsApi (server)
//! ```
//!
//! ## Modules
//!
//! - [`store`] — Local key/value stores with legacy-key migration
//! - [`token`] — Options API contract and the token refresh state machine
//! - [`preferences`] — The preference set and its backends

pub mod preferences;
pub mod store;
pub mod token;

pub use preferences::{
    LocalBackend, PreferenceBackend, PreferenceError, Preferences, RemoteBackend, PREFERENCE_NAME,
};
pub use store::{FileStore, LocalStore, MemoryStore, StoreError, LEGACY_KEY};
pub use token::{ApiError, OptionsApi, OptionsClient, TokenState};
