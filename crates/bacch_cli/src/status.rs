//! `bacch status`: list tracked documents and whether they changed.

use std::path::Path;

use bacch_cache::{BuildCache, CacheOrigin, EntryStatus};
use serde::Serialize;

use crate::pipeline::resolve_invocation;
use crate::{GlobalArgs, ReportFormat, StatusArgs};

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    title: &'a str,
    origin: CacheOrigin,
    documents: Vec<DocumentStatus<'a>>,
    orphaned: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct DocumentStatus<'a> {
    name: &'a str,
    path: &'a Path,
    status: EntryStatus,
}

/// Runs the `bacch status` command.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let invocation = resolve_invocation(global, args.sync, None)?;
    let cache = BuildCache::load(invocation)?;
    let report = build_report(&cache);

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print!("{}", render_text(&report)),
    }
    Ok(0)
}

fn build_report(cache: &BuildCache) -> StatusReport<'_> {
    StatusReport {
        title: &cache.config().meta.title,
        origin: cache.origin(),
        documents: cache
            .content()
            .values()
            .map(|e| DocumentStatus {
                name: e.name(),
                path: e.path(),
                status: e.status(),
            })
            .collect(),
        orphaned: cache.orphaned(),
    }
}

fn render_text(report: &StatusReport<'_>) -> String {
    let mut out = format!("{}\n", report.title);
    for doc in &report.documents {
        let label = match doc.status {
            EntryStatus::Fresh => "fresh",
            EntryStatus::Stale => "changed",
            EntryStatus::Missing => "missing",
            EntryStatus::Unchecked => "untracked",
        };
        out.push_str(&format!("  {label:>9}  {}\n", doc.name));
    }
    if report.documents.is_empty() {
        out.push_str("  no documents\n");
    }
    out
}
