//! `bacch build`: compile a target document.
//!
//! Orchestrates one build:
//! 1. Load the build cache and report changed documents
//! 2. Register the project's resources
//! 3. Resolve the requested target to its owning resource
//! 4. Assemble the target with its includes expanded
//! 5. Write the assembled XML

use std::path::{Path, PathBuf};

use bacch_cache::{BuildCache, EntryStatus};
use bacch_common::DOCUMENT_EXT;
use bacch_config::Config;
use bacch_project::{Project, ResourcePolicy};

use crate::pipeline::resolve_invocation;
use crate::{BuildArgs, GlobalArgs};

/// Default output directory under the working directory.
const DEFAULT_OUTPUT_DIR: &str = "build";

/// Runs the `bacch build` command.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let invocation = resolve_invocation(global, args.sync, args.name.as_deref())?;
    let fallback_wdir = invocation.wdir.clone();
    let cache = BuildCache::load(invocation)?;
    let config = cache.config();

    if !global.quiet {
        eprintln!("   Loading {}", config.meta.title);
        if global.verbose {
            eprintln!("     Cache {:?}", cache.origin());
        }
        for entry in cache.content().values() {
            match entry.status() {
                EntryStatus::Stale => eprintln!("   Changed {}", entry.name()),
                EntryStatus::Missing => eprintln!("   Missing {}", entry.name()),
                EntryStatus::Fresh | EntryStatus::Unchecked => {}
            }
        }
    }

    let project = Project::from_config(config, ResourcePolicy::default())?;
    let selector = project.resolve_build_target(args.name.as_deref())?;
    log::debug!("resolved build target {selector:?}");
    let tree = project.compile(&selector)?;

    let target = match selector.target {
        Some(ref name) => name.clone(),
        None => bacch_common::document_stem(&tree.source)
            .unwrap_or(selector.resource.as_str())
            .to_string(),
    };
    let wdir = config
        .invocation_args
        .as_ref()
        .map(|a| a.wdir.clone())
        .unwrap_or(fallback_wdir);
    let output = determine_output_path(
        config,
        &wdir,
        &target,
        args.output_dir.as_deref().map(Path::new),
    );

    if let Some(dir) = output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&output, tree.to_xml())?;

    if !global.quiet {
        eprintln!("  Compiled {}:{target}", selector.resource);
        eprintln!("     Wrote {}", output.display());
    }
    Ok(0)
}

/// Picks the file the assembled target is written to.
///
/// `--output-dir` wins; otherwise a `builds` entry with the target's id
/// supplies the directory, relative to `wdir`; otherwise `wdir/build`.
fn determine_output_path(
    config: &Config,
    wdir: &Path,
    target: &str,
    output_dir: Option<&Path>,
) -> PathBuf {
    let file = format!("{target}.{DOCUMENT_EXT}");
    if let Some(dir) = output_dir {
        return dir.join(file);
    }
    match config.builds.get(target) {
        Some(build) => wdir.join(&build.path).join(file),
        None => wdir.join(DEFAULT_OUTPUT_DIR).join(file),
    }
}
