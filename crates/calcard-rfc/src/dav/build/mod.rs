//! DAV XML response emission.

pub mod error;
pub mod multistatus;
