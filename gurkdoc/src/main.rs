//! gurkdoc — build the Gurklang documentation site.
//!
//! - `gurkdoc build -b bundle.json -o site/` renders every page of a compiled
//!   bundle with tooltips and math, plus the highlight.js grammar script
//! - `gurkdoc highlight sample.gurk` renders a code sample
//! - `gurkdoc grammar` prints the highlight.js registration script
//! - `gurkdoc lookup dup` shows a definition

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gurkdoc::bundle::ContentBundle;
use gurkdoc::codeblock::CodeKind;
use gurkdoc::config::{self, SiteConfig};
use gurkdoc::definitions::{qualified_name, DefinitionTable};
use gurkdoc::{render, site};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gurkdoc",
    about = "Build the Gurklang documentation site and its syntax highlighting assets"
)]
struct Cli {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a compiled documentation bundle into a static site
    Build {
        /// Bundle file: {"compiledHtml": {...}, "start": "..."}
        #[arg(short = 'b', long)]
        bundle: PathBuf,

        /// Output directory
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Extra definition files (glob patterns supported), merged over the built-in table
        #[arg(short = 'd', long)]
        definitions: Vec<String>,

        /// Site configuration file (JSON)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Module whose names are shown unqualified
        #[arg(long)]
        prelude: Option<String>,

        /// Vertical tooltip offset in pixels
        #[arg(long)]
        tooltip_offset: Option<f64>,

        /// How long page passes wait for their prerequisites
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Render a Gurklang code sample. Reads stdin when no file is given.
    Highlight {
        file: Option<PathBuf>,

        /// Treat the input as a REPL transcript
        #[arg(long)]
        repl: bool,

        /// Output format: code (default), hljs
        #[arg(short = 'f', long, default_value = "code")]
        format: String,
    },

    /// Print the highlight.js registration script for both grammars
    Grammar,

    /// Show the documentation of a name
    Lookup {
        name: String,

        /// Extra definition files (glob patterns supported)
        #[arg(short = 'd', long)]
        definitions: Vec<String>,

        #[arg(long, default_value = config::DEFAULT_PRELUDE)]
        prelude: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build {
            bundle,
            output,
            definitions,
            config,
            prelude,
            tooltip_offset,
            timeout_ms,
        } => {
            let mut site_config = match config {
                Some(path) => SiteConfig::load(&path)?,
                None => SiteConfig::default(),
            };
            if let Some(prelude) = prelude {
                site_config.prelude = prelude;
            }
            if let Some(offset) = tooltip_offset {
                site_config.tooltip_offset = offset;
            }
            if let Some(ms) = timeout_ms {
                site_config.ready_timeout_ms = ms;
            }
            build(&bundle, &output, &definitions, &site_config).await
        }
        Command::Highlight { file, repl, format } => highlight(file.as_deref(), repl, &format),
        Command::Grammar => {
            print!("{}", site::grammar_script());
            Ok(())
        }
        Command::Lookup {
            name,
            definitions,
            prelude,
        } => lookup(&name, &definitions, &prelude),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn build(
    bundle_path: &Path,
    output: &Path,
    definitions: &[String],
    config: &SiteConfig,
) -> Result<()> {
    let source = fs::read_to_string(bundle_path)
        .with_context(|| format!("failed to read {}", bundle_path.display()))?;
    let bundle = ContentBundle::from_json(&source)
        .with_context(|| format!("invalid bundle {}", bundle_path.display()))?;
    let table = load_definitions(definitions)?;
    let written = site::build(&bundle, table, config, output).await?;
    tracing::info!(files = written.len(), output = %output.display(), "site built");
    Ok(())
}

fn highlight(file: Option<&Path>, repl: bool, format: &str) -> Result<()> {
    let source = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            input
        }
    };
    let kind = if repl { CodeKind::Repl } else { CodeKind::Plain };
    let renderer = render::create_renderer(format, kind)?;
    println!("{}", renderer.render(&source));
    Ok(())
}

fn lookup(name: &str, definitions: &[String], prelude: &str) -> Result<()> {
    let table = load_definitions(definitions)?;
    let Some(definition) = table.lookup(name) else {
        bail!("no definition for {}", name);
    };
    let prefix = format!("{}.", definition.module);
    let bare = name.strip_prefix(&prefix).unwrap_or(name);
    println!("{}", qualified_name(bare, &definition.module, prelude));
    println!("  {}", definition.stack_diagram);
    println!("  {}", definition.explanation);
    Ok(())
}

/// Built-in table with every matched definition file merged over it.
fn load_definitions(patterns: &[String]) -> Result<DefinitionTable> {
    let mut table = DefinitionTable::builtin();
    for path in expand_globs(patterns)? {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let extra = DefinitionTable::from_json(&source)
            .with_context(|| format!("invalid definition file {}", path.display()))?;
        table.merge(extra);
    }
    Ok(table)
}

/// Definition files are JSON.
const SUPPORTED_EXTENSIONS: &[&str] = &["json"];

/// Expand glob patterns into a list of real file paths.
/// Also handles bare directory paths by scanning for definition files.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                let supported = p
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext));
                if p.is_file() && supported {
                    files.push(p);
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            eprintln!("warning: no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sorted so later files win deterministically.
    files.sort();
    files.dedup();
    Ok(files)
}
