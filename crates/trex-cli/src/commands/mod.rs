//! CLI command implementations.

pub mod common;
pub mod inverse;
pub mod mitigate;
pub mod twirl;
pub mod version;
