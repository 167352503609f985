//! `bacch clean`: remove the build cache.

use bacch_cache::BuildCache;

use crate::pipeline::resolve_wdir;
use crate::GlobalArgs;

/// Runs the `bacch clean` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let wdir = resolve_wdir(global)?;
    let removed = BuildCache::clear(&wdir)?;
    if !global.quiet {
        if removed {
            eprintln!("   Removed build cache in {}", wdir.display());
        } else {
            eprintln!("   Nothing to clean");
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(wdir: &std::path::Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            source: None,
            wdir: Some(wdir.display().to_string()),
        }
    }

    #[test]
    fn clean_removes_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join(".bacch");
        std::fs::create_dir(&cache_dir).unwrap();
        std::fs::write(cache_dir.join("bacch.cache"), b"stale").unwrap();

        assert_eq!(run(&global(dir.path())).unwrap(), 0);
        assert!(!cache_dir.exists());
    }

    #[test]
    fn clean_without_cache() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run(&global(dir.path())).unwrap(), 0);
    }
}
