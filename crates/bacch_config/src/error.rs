//! Error types for descriptor loading and validation.

/// Errors that can occur when loading or validating a project descriptor.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the descriptor.
    #[error("failed to read descriptor: {0}")]
    IoError(#[from] std::io::Error),

    /// The descriptor is not well-formed XML.
    #[error("failed to parse descriptor: {0}")]
    ParseError(String),

    /// A required structural section is absent from the descriptor.
    #[error("missing required section: {0}")]
    MissingSection(String),

    /// A declared element lacks a required attribute.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Local name of the offending element.
        element: String,
        /// Name of the missing attribute.
        attribute: String,
    },

    /// No resource carries the source role.
    #[error("unable to find source directory: no resource has role 'src'")]
    MissingSourceResource,

    /// More than one resource carries the source role.
    #[error("multiple source directories: '{first}' and '{second}' both have role 'src'")]
    AmbiguousSourceResource {
        /// The first source resource in declaration order.
        first: String,
        /// The second source resource in declaration order.
        second: String,
    },
}
