//! Role to department access control and store routing

pub mod policy;
pub mod router;

pub use policy::AccessPolicy;
pub use router::{AccessRouter, Route};
