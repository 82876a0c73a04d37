#![allow(dead_code)]

/// Shorthand return type for tests that use `?` against fallible serialization calls.
pub type Anyhow = anyhow::Result<()>;
