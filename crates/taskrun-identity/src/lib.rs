//! Identity probes for taskrun
//!
//! Answers two questions about the host at task-configuration time: who is
//! running this process, and may a given account use the elevation tool.

pub mod error;
pub mod probe;

pub use error::ProbeError;
pub use probe::{DEFAULT_ELEVATION_GROUP, IdentityProbe, SystemProbe};
