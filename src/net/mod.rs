//! Networking modules for the helper backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` owns HTTP and error normalization, `api` maps endpoints to
//! typed calls, and `types` defines the shared wire schema.

pub mod api;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
