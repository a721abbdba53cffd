use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use symref::config::Config;
use symref::diagnostics;
use symref::dictionary::{LoadOptions, TargetDictionary};
use symref::error::Error;
use symref::link_text::{Convention, DisplayOptions};
use symref::reference_parser::{GenericContext, parse_reference};
use symref::resolver::LinkTextResolver;
use symref::snapshot::{SNAPSHOT_FILE, Snapshot};
use symref::visibility::VisibilityFlag;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SYMREF_LOG";

/// Command line.
#[derive(Parser)]
#[command(name = "symref", about = "Symbol indexing and cross-reference rendering for API documentation")]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Driver subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Load every source unit in a metadata directory and write its snapshot
    Index {
        /// Metadata directory holding the source units
        dir: PathBuf,
        /// Config file to use instead of <dir>/.symref.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Ignore an existing snapshot and reload every unit
        #[arg(long)]
        fresh: bool,
    },
    /// Render the link text of one identifier from a snapshot
    Render {
        /// Identifier to render, e.g. `M:N.Widget.#ctor(N.Color)`
        id: String,
        /// Metadata directory holding the snapshot
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Show the enclosing namespace and types
        #[arg(long)]
        container: bool,
        /// Show generic parameter and argument lists
        #[arg(long)]
        templates: bool,
        /// Show parameter lists
        #[arg(long)]
        parameters: bool,
        /// Output convention: csharp, visualbasic, cpp, fsharp or neutral
        #[arg(long, default_value = "csharp")]
        convention: Convention,
        /// Identifier whose generic parameters bind bare ``n / `n references
        #[arg(long)]
        context: Option<String>,
        /// Print a JSON record instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Validate the config and print the effective visibility flags
    Config {
        /// Directory holding .symref.toml
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Config file to use instead of <dir>/.symref.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Index { dir, config, fresh } => cmd_index(&dir, config.as_deref(), fresh),
        Commands::Render {
            id,
            dir,
            container,
            templates,
            parameters,
            convention,
            context,
            json,
        } => {
            let options = display_options(container, templates, parameters);
            cmd_render(&RenderRequest {
                context: context.as_deref().unwrap_or(&id),
                convention,
                dir: &dir,
                id: &id,
                json,
                options,
            })
        },
        Commands::Config { dir, config } => cmd_config(&dir, config.as_deref()),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(3)
        },
    };
}

/// Install the stderr subscriber, filtered by `SYMREF_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| return EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Combine the display switches; none given means the default set.
fn display_options(container: bool, templates: bool, parameters: bool) -> DisplayOptions {
    if !(container || templates || parameters) {
        return DisplayOptions::default();
    }
    return [
        (container, DisplayOptions::SHOW_CONTAINER),
        (templates, DisplayOptions::SHOW_TEMPLATES),
        (parameters, DisplayOptions::SHOW_PARAMETERS),
    ]
    .into_iter()
    .filter(|(on, _)| return *on)
    .fold(DisplayOptions::NONE, |options, (_, flag)| return options | flag);
}

/// Explicit `--config` file, or `.symref.toml` in `dir` when present.
///
/// # Errors
///
/// Returns config loading errors.
fn load_config(dir: &Path, explicit: Option<&Path>) -> Result<Config, Error> {
    return match explicit {
        Some(path) => Config::load_file(path),
        None => Config::load(dir),
    };
}

/// Bulk-load `dir` on top of its existing snapshot and rewrite the snapshot.
///
/// # Errors
///
/// Returns config, source-unit, snapshot and I/O errors.
fn cmd_index(dir: &Path, config: Option<&Path>, fresh: bool) -> Result<ExitCode, Error> {
    let config = load_config(dir, config)?;
    let snapshot_path = dir.join(SNAPSHOT_FILE);
    let dictionary = TargetDictionary::new();

    if !fresh && snapshot_path.exists() {
        Snapshot::read(&snapshot_path)?.restore(&dictionary);
        info!(targets = dictionary.len(), "restored snapshot");
    }

    let options = LoadOptions {
        allow: config.index.allow,
        pattern: config.index.pattern,
        workers: config.index.workers,
    };
    let report = dictionary.load_all(dir, &options)?;
    let snapshot = Snapshot::capture(&dictionary);
    snapshot.write(&snapshot_path)?;

    println!(
        "Loaded {} units ({} already present, {} filtered), {} new targets",
        report.loaded, report.skipped_present, report.skipped_filtered, report.targets
    );
    println!("Wrote {} targets to {SNAPSHOT_FILE}", snapshot.targets.len());
    return Ok(ExitCode::SUCCESS);
}

/// Everything `render` needs besides the snapshot.
struct RenderRequest<'a> {
    /// Identifier supplying the generic context.
    context: &'a str,
    /// Output convention.
    convention: Convention,
    /// Metadata directory holding the snapshot.
    dir: &'a Path,
    /// Identifier to render.
    id: &'a str,
    /// Emit JSON instead of text.
    json: bool,
    /// Display switches.
    options: DisplayOptions,
}

/// Resolve one identifier against the snapshot. Unresolved identifiers are
/// still printed (via the fallback rendering) but exit with 1.
///
/// # Errors
///
/// Returns snapshot errors and JSON serialization errors.
fn cmd_render(request: &RenderRequest<'_>) -> Result<ExitCode, Error> {
    let dictionary = TargetDictionary::new();
    Snapshot::read(&request.dir.join(SNAPSHOT_FILE))?.restore(&dictionary);

    let reference = parse_reference(request.id, &GenericContext::from_cref(request.context));
    let resolver = LinkTextResolver::new(&dictionary);
    let resolved = resolver.is_resolved(&reference);
    let text = resolver.render_reference(&reference, request.options);
    let rendered = text.render(request.convention);

    if request.json {
        let record = serde_json::json!({
            "convention": request.convention.name(),
            "id": request.id,
            "resolved": resolved,
            "segments": text.segments,
            "text": rendered,
        });
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{rendered}");
    }

    let stats = dictionary.stats();
    info!(hits = stats.hits, misses = stats.misses, entries = stats.entries, "dictionary lookups");

    if resolved {
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!("unresolved: {}", request.id);
    return Ok(ExitCode::from(1));
}

/// Print every visibility flag with its effective state, then the index
/// options.
///
/// # Errors
///
/// Returns config loading errors.
fn cmd_config(dir: &Path, config: Option<&Path>) -> Result<ExitCode, Error> {
    let config = load_config(dir, config)?;
    let settings = config.visibility;
    for flag in VisibilityFlag::ALL {
        let state = if settings.is_enabled(flag) { "on" } else { "off" };
        println!("{:<40} {state}", flag.config_key());
    }
    println!();
    println!("index.pattern = {:?}", config.index.pattern);
    println!("index.allow   = {:?}", config.index.allow);
    println!("index.workers = {}", config.index.workers);
    return Ok(ExitCode::SUCCESS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_switches_means_default_options() {
        assert_eq!(display_options(false, false, false), DisplayOptions::default());
    }

    #[test]
    fn switches_select_exactly_what_is_asked() {
        assert_eq!(display_options(true, false, false), DisplayOptions::SHOW_CONTAINER);
        assert_eq!(
            display_options(false, true, true),
            DisplayOptions::SHOW_TEMPLATES | DisplayOptions::SHOW_PARAMETERS
        );
    }

    #[test]
    fn cli_parses_render_flags() {
        let cli = Cli::parse_from(["symref", "render", "T:N.Widget", "--convention", "vb", "--container"]);
        let Commands::Render { id, convention, container, .. } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(id, "T:N.Widget");
        assert_eq!(convention, Convention::VisualBasic);
        assert!(container);
    }
}
