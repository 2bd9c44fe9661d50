//! Daemon Provisioners
//!
//! Concrete implementations of the
//! [`DaemonProvisioner`](crate::domain::ports::DaemonProvisioner) port and
//! the filestore-on-device runner.

pub mod filestore;
pub mod local;

pub use filestore::{run_filestore_on_device, FilestoreDevice};
pub use local::{daemon_args, LocalProvisioner, OsdResourceConfig, PreparedResources};
