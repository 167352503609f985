//! Shared helpers for CLI commands: descriptor discovery and invocation
//! arguments.

use std::path::{Path, PathBuf};

use bacch_config::{InvocationArgs, DESCRIPTOR_FILE};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest `project.xml`.
///
/// Returns the path of the descriptor, or an error if none is found.
pub fn find_descriptor(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(DESCRIPTOR_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {DESCRIPTOR_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the descriptor path from global CLI args.
///
/// If `--source` names a directory, its `project.xml` is used. Without
/// `--source`, walks up from the current directory.
pub fn resolve_descriptor(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match global.source {
        Some(ref source) => {
            let p = PathBuf::from(source);
            if p.is_dir() {
                Ok(p.join(DESCRIPTOR_FILE))
            } else {
                Ok(p)
            }
        }
        None => find_descriptor(&std::env::current_dir()?),
    }
}

/// Builds the invocation arguments handed to the build cache.
pub fn resolve_invocation(
    global: &GlobalArgs,
    sync: bool,
    build: Option<&str>,
) -> Result<InvocationArgs, Box<dyn std::error::Error>> {
    let descriptor = resolve_descriptor(global)?;
    let mut args = InvocationArgs::for_descriptor(&descriptor);
    if let Some(ref wdir) = global.wdir {
        args.wdir = PathBuf::from(wdir);
    }
    args.sync = sync;
    args.build = build.map(str::to_string);
    Ok(args)
}

/// Resolves the working directory: `--wdir`, else the descriptor's
/// directory.
pub fn resolve_wdir(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match global.wdir {
        Some(ref wdir) => Ok(PathBuf::from(wdir)),
        None => Ok(InvocationArgs::for_descriptor(&resolve_descriptor(global)?).wdir),
    }
}
