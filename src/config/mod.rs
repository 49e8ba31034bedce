//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → ops.rs atomic swap of the OperationsConfig snapshot
//!     → next CRConfig request sees the new CDN set
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Only the operations section is applied live; the rest needs a restart

pub mod loader;
pub mod ops;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use ops::{OperationsConfig, OpsConfigHandle};
pub use schema::{
    AuthorityConfig, AuthorityKind, ListenerConfig, LogFormat, MonitorConfig, ObservabilityConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
