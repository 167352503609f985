//! Project resources, build target resolution, and compile dispatch.
//!
//! A [`Project`] is built from the resources declared in a
//! [`Config`](bacch_config::Config). Each registered [`Resource`] answers
//! whether it owns a build target, reports a [`SectionIndex`] of its
//! documents, and compiles a target into a [`DocumentTree`] with its
//! XIncludes expanded.

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod project;
pub mod resource;
pub mod sections;

pub use document::{Attribute, DocumentNode, DocumentTree, Element};
pub use error::ProjectError;
pub use project::{BuildSelector, Project, ResourcePolicy};
pub use resource::{OutputResource, Resource, ResourceDirs, Resources, SourceResource};
pub use sections::{Section, SectionIndex};
