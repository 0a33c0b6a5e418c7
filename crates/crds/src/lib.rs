//! Multi-Compute CRD Definitions
//!
//! Kubernetes Custom Resource Definitions shared by the multi-compute
//! controllers, plus the Fleet resources they write and read.

pub mod channel;
pub mod condition;
pub mod fleet;
pub mod labels;
pub mod multi_compute_config;
pub mod selector;

pub use channel::*;
pub use condition::*;
pub use fleet::*;
pub use multi_compute_config::*;
pub use selector::*;
