use anyhow::{Context, Result};
use apidoc_render::{Diagnostic, Node, RenderOptions, Severity};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod build;
mod config;

#[derive(Parser)]
#[command(name = "apidoc", version, about = "Render API declaration models as CommonMark reference pages")]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log debug detail to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RenderFormat {
    Markdown,
    Html,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every page listed in apidoc.json into outDir
    Build {
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Delete .md files under outDir that no page produced
        #[arg(long)]
        prune: bool,

        /// Rebuild whenever apidoc.json or the model changes
        #[arg(long)]
        watch: bool,
    },

    /// Render a single node tree
    Render {
        /// Path to a .json, .yaml or .yml node tree
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: RenderFormat,

        /// Page path the tree is rendered on; page links are made relative to it
        #[arg(long)]
        page: Option<String>,

        /// Render the tree as given, without simplifying it first
        #[arg(long)]
        raw: bool,
    },

    /// Validate node tree file(s)
    Validate {
        /// Path to the .json, .yaml or .yml file(s)
        files: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            dry_run,
            prune,
            watch,
        } => {
            let opts = build::BuildOpts {
                dry_run,
                prune,
                quiet: cli.quiet,
            };
            let report = build::run_build(&opts)?;
            if !cli.quiet {
                report.print_summary();
            }
            if watch {
                build::watch_and_rebuild(&opts)?;
            }
        }
        Commands::Render {
            file,
            format,
            page,
            raw,
        } => {
            handle_render(&file, format, page, raw)?;
        }
        Commands::Validate { files } => {
            handle_validate(&files)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read a node tree, choosing YAML or JSON by file extension.
fn load_node(file: &str) -> Result<Node> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read '{file}'"))?;
    let is_yaml = Path::new(file)
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    let node = if is_yaml {
        Node::from_yaml(&content)
    } else {
        Node::from_json(&content)
    };
    node.with_context(|| format!("Failed to parse '{file}'"))
}

fn handle_render(
    file: &str,
    format: RenderFormat,
    page: Option<String>,
    raw: bool,
) -> Result<()> {
    let node = load_node(file)?;
    let options = page.map(RenderOptions::for_page).unwrap_or_default();

    let markdown = if raw {
        apidoc_render::render_markdown(&node, &options)?
    } else {
        node.to_markdown(&options)?
    };

    let output = match format {
        RenderFormat::Markdown => markdown,
        RenderFormat::Html => {
            let title = match &node {
                Node::Page { metadata, .. } => metadata.title.clone(),
                _ => file.to_string(),
            };
            apidoc_render::preview::preview_page(&title, &markdown)
        }
    };

    println!("{output}");
    Ok(())
}

fn handle_validate(files: &[String]) -> Result<()> {
    let mut has_errors = false;

    for file in files {
        let diagnostics = match load_node(file) {
            Ok(node) => node.validate(),
            Err(e) => vec![Diagnostic::error("P001", format!("{e:#}"))],
        };

        if diagnostics.is_empty() {
            println!("{}: {}", file, "OK".green());
        } else {
            for diag in &diagnostics {
                has_errors |= diag.severity == Severity::Error;
                println!("{}", format_diagnostic(file, diag));
            }
        }
    }

    if has_errors {
        std::process::exit(1);
    }

    Ok(())
}

/// `file: severity: [code] message`, with the severity colored.
pub(crate) fn format_diagnostic(file: &str, diag: &Diagnostic) -> String {
    let severity_str = match diag.severity {
        Severity::Error => format!("{}", "error".red().bold()),
        Severity::Warning => format!("{}", "warning".yellow().bold()),
        Severity::Info => format!("{}", "info".cyan().bold()),
    };

    let code_str = match &diag.code {
        Some(c) => format!("[{}] ", c),
        None => String::new(),
    };

    format!("{file}: {severity_str}: {code_str}{}", diag.message)
}
