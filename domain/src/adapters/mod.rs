//! Test-only adapters that live inside the domain crate for convenience.
//!
//! These are intended for unit testing and local demos. The network-backed
//! probe lives in the `http-probe` crate.

pub mod static_probe;
