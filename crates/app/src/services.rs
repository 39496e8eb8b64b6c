//! Application services backing the ports.

pub mod registry;
