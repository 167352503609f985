//! Incremental build cache for bacch projects.
//!
//! A [`BuildCache`] pairs the project [`Config`](bacch_config::Config) with
//! one [`ContentEntry`] per source document. It is loaded from
//! `.bacch/bacch.cache` at the start of every invocation, reconciled against
//! the descriptor and the source directory, and written back before it is
//! handed to the caller.
//!
//! The cache file is read once and written once per invocation without any
//! locking. Two invocations running at the same time on the same project
//! race on that file; callers must not run them concurrently.

#![warn(missing_docs)]

pub mod cache;
pub mod entry;
pub mod error;
pub mod registry;
pub mod snapshot;

pub use cache::{BuildCache, CacheOrigin};
pub use entry::{ContentEntry, EntryStatus};
pub use error::CacheError;
pub use registry::{scan, ScanReport};
