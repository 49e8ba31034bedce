//! CRConfig monitor library: publishes a CDN's CRConfig, or an envelope of
//! several CDNs' CRConfigs, fetched from a configuration authority.

pub mod config;
pub mod crconfig;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod register;
pub mod session;

pub use config::{MonitorConfig, OperationsConfig, OpsConfigHandle};
pub use crconfig::{serve_crconfig, CrConfigError, PublishMode, PublishedCrConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use register::CdnRegister;
pub use session::{ConfigAuthoritySession, ConfigDocument, SessionError};
