//! Test utilities shared across the crate's unit tests.
