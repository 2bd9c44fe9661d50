//! OSD Provisioning Module
//!
//! Resource selection, CRUSH location formatting, agent construction, and
//! the provisioning workflow for a single node's storage daemon.

pub mod agent;
pub mod context;
pub mod location;
pub mod orchestrator;
pub mod selection;
pub mod store_config;

pub use agent::*;
pub use context::*;
pub use location::*;
pub use orchestrator::*;
pub use selection::*;
pub use store_config::*;
