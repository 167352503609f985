//! Error types for project loading, target resolution, and compilation.

use std::path::PathBuf;

/// Errors that can occur while loading a project or compiling a target.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The descriptor declares no resources at all.
    #[error("unable to locate project resources")]
    MissingResources,

    /// A declared resource directory does not exist.
    #[error("resource '{name}' directory not found: {path}")]
    MissingResourceDirectory {
        /// The resource id.
        name: String,
        /// The directory that was expected.
        path: PathBuf,
    },

    /// Neither a target was requested nor a default build resource declared.
    #[error("unable to identify build target: none requested and no source resource declared")]
    NoBuildTarget,

    /// No resource owns the requested target and there is no fallback.
    #[error("need support for default builds: no resource provides {}", describe_target(.requested))]
    UnsupportedDefaultBuild {
        /// The requested target, `None` for the default target.
        requested: Option<String>,
    },

    /// A selector names a resource that is not registered.
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    /// A resource was asked to compile a target it does not have.
    #[error("resource '{resource}' does not provide {}", describe_target(.target))]
    UnknownTarget {
        /// The resource id.
        resource: String,
        /// The requested target.
        target: Option<String>,
    },

    /// The resource kind does not compile documents.
    #[error("resource '{0}' cannot be compiled")]
    NotCompilable(String),

    /// An I/O error occurred while reading a resource.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A document is not well-formed XML or lacks a required attribute.
    #[error("failed to parse {path}: {reason}")]
    Document {
        /// The document path.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// An XInclude reference points at nothing.
    #[error("unresolved include '{href}' in {path}")]
    UnresolvedInclude {
        /// The `href` attribute value.
        href: String,
        /// The including document.
        path: PathBuf,
    },

    /// An XInclude reference is of a kind that cannot be followed.
    #[error("invalid include '{href}' in {path}: {reason}")]
    InvalidInclude {
        /// The `href` attribute value.
        href: String,
        /// The including document.
        path: PathBuf,
        /// Why the reference was rejected.
        reason: String,
    },

    /// A document includes itself, directly or indirectly.
    #[error("include cycle through {0}")]
    IncludeCycle(PathBuf),
}

fn describe_target(target: &Option<String>) -> String {
    match target {
        Some(name) => format!("target '{name}'"),
        None => "the default target".to_string(),
    }
}
