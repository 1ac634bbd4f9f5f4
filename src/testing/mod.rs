//! Fixture builders for building the domain types scenario and property
//! tests run against. Exposed as an ordinary public module (not gated
//! behind `#[cfg(test)]`) because `tests/` integration tests compile
//! against this crate as an external dependency and can only reach
//! `#[cfg(test)]` items of their own crate, not this one's.

pub mod fixtures;
