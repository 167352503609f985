//! bacch CLI: the command-line interface for bacch DocBook projects.
//!
//! Provides `bacch build` for compiling a target document, `bacch status`
//! for reporting which documents changed since the last invocation, and
//! `bacch clean` for discarding the build cache.

#![warn(missing_docs)]

mod build;
mod clean;
mod pipeline;
mod status;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// bacch: DocBook project builder.
#[derive(Parser, Debug)]
#[command(name = "bacch", version, about = "bacch DocBook project builder")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the `project.xml` descriptor.
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Working directory that resource paths are resolved against.
    #[arg(long, global = true)]
    pub wdir: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a build target.
    Build(BuildArgs),
    /// Show which documents changed since the last invocation.
    Status(StatusArgs),
    /// Remove the build cache.
    Clean,
}

/// Arguments for the `bacch build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Target document name. If omitted, the default build is used.
    pub name: Option<String>,

    /// Discard the build cache and reread the descriptor.
    #[arg(long)]
    pub sync: bool,

    /// Directory to write the assembled document to.
    #[arg(short, long)]
    pub output_dir: Option<String>,
}

/// Arguments for the `bacch status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Discard the build cache and reread the descriptor.
    #[arg(long)]
    pub sync: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Status output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose information.
    pub verbose: bool,
    /// Optional path to the descriptor.
    pub source: Option<String>,
    /// Optional working directory.
    pub wdir: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        source: cli.source,
        wdir: cli.wdir,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
        Command::Clean => clean::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the logger. `RUST_LOG` takes precedence over the flags.
fn init_logging(quiet: bool, verbose: bool) {
    let level = log_level(quiet, verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn log_level(quiet: bool, verbose: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, true) => "info",
        (false, false) => "warn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["bacch", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.name.is_none());
                assert!(!args.sync);
                assert!(args.output_dir.is_none());
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_with_args() {
        let cli = Cli::parse_from([
            "bacch",
            "build",
            "chapter1",
            "--sync",
            "--output-dir",
            "out",
        ]);
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.name.as_deref(), Some("chapter1"));
                assert!(args.sync);
                assert_eq!(args.output_dir.as_deref(), Some("out"));
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_status_json() {
        let cli = Cli::parse_from(["bacch", "status", "--format", "json"]);
        match cli.command {
            Command::Status(ref args) => {
                assert_eq!(args.format, ReportFormat::Json);
                assert!(!args.sync);
            }
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn parse_status_default_format() {
        let cli = Cli::parse_from(["bacch", "status"]);
        match cli.command {
            Command::Status(ref args) => assert_eq!(args.format, ReportFormat::Text),
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn parse_clean() {
        let cli = Cli::parse_from(["bacch", "clean"]);
        assert!(matches!(cli.command, Command::Clean));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "bacch",
            "--quiet",
            "--source",
            "book/project.xml",
            "--wdir",
            "book",
            "status",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.source.as_deref(), Some("book/project.xml"));
        assert_eq!(cli.wdir.as_deref(), Some("book"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bacch", "build", "-v", "--wdir", "/tmp/book"]);
        assert!(cli.verbose);
        assert_eq!(cli.wdir.as_deref(), Some("/tmp/book"));
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level(false, false), "warn");
        assert_eq!(log_level(false, true), "info");
        assert_eq!(log_level(true, false), "error");
        assert_eq!(log_level(true, true), "error");
    }
}
