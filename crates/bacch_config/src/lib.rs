//! Parsing of the `project.xml` descriptor into a strongly-typed [`Config`].
//!
//! The descriptor declares the project's resources (content and output
//! directories), build outputs, prompt strings, and book declarations. This
//! crate reads it into a [`Config`] stamped with the descriptor's
//! modification time, which the build cache later compares against to decide
//! whether its snapshot is stale.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;
pub mod xml;

pub use error::ConfigError;
pub use loader::{load_config, parse_descriptor, DESCRIPTOR_FILE};
pub use types::*;
