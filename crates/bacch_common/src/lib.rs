//! Shared foundational types used across the bacch book builder.
//!
//! This crate provides content hashing for staleness detection and the
//! filesystem timestamp helpers that the descriptor loader and the build
//! cache compare against each other.

#![warn(missing_docs)]

pub mod fs;
pub mod hash;

pub use fs::{document_stem, list_documents, modified_time, DOCUMENT_EXT};
pub use hash::ContentHash;
