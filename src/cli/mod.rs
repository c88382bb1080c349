//! CLI command implementations

mod create;
pub mod style;

pub use create::run_create;
