//! projtree - Build and inspect IDE-style project trees from a directory.
//!
//! Usage:
//!   projtree tree [PATH]        Scan a directory and print its project tree
//!   projtree classify FILES...  Show the file kind of each path
//!   projtree --help             Show help

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use itertools::{Itertools, Position};

use projtree_core::{
    DefaultProjectManager, ExtensionMimeDatabase, FileType, NoVcs, Node, NodeId, ProjectTree,
    VcsLookup,
};
use projtree_scan::{FileScanner, ScanConfig, ScanEvent, ScanOutcome, start_scan};

#[derive(Parser)]
#[command(
    name = "projtree",
    version,
    about = "Build IDE-style project trees from a directory",
    long_about = "projtree scans a directory, classifies its files and arranges them \
                  into a project tree with compressed folder chains, the way an IDE \
                  project view shows them."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and print its project tree
    Tree {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include hidden entries
        #[arg(long)]
        hidden: bool,

        /// Glob pattern of entry names to skip (repeatable)
        #[arg(short, long = "ignore")]
        ignore: Vec<String>,

        /// Maximum directory depth
        #[arg(short = 'd', long)]
        max_depth: Option<u32>,

        /// Do not follow symbolic links to directories
        #[arg(long)]
        no_follow: bool,

        /// Keep single-child folder chains
        #[arg(long)]
        no_compress: bool,

        /// Do not skip version control metadata
        #[arg(long)]
        no_vcs: bool,

        /// Leave out files whose kind is unknown
        #[arg(long)]
        known_only: bool,

        /// Report scan progress on stderr
        #[arg(short, long)]
        progress: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the file kind of each path
    Classify {
        /// Files to classify
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options of the `tree` subcommand.
struct TreeOptions {
    compress: bool,
    vcs: bool,
    known_only: bool,
    progress: bool,
    format: OutputFormat,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Tree {
            path,
            hidden,
            ignore,
            max_depth,
            no_follow,
            no_compress,
            no_vcs,
            known_only,
            progress,
            format,
        } => {
            let config = ScanConfig::builder()
                .root(path)
                .include_hidden(hidden)
                .follow_symlinks(!no_follow)
                .ignore_patterns(ignore)
                .max_depth(max_depth)
                .build()
                .context("Invalid scan options")?;
            let options = TreeOptions {
                compress: !no_compress,
                vcs: !no_vcs,
                known_only,
                progress,
                format,
            };
            run_tree(config, &options)?;
        }
        Command::Classify { paths, format } => {
            run_classify(&paths, format)?;
        }
    }

    Ok(())
}

fn vcs_lookup(enabled: bool) -> Arc<dyn VcsLookup> {
    #[cfg(feature = "git")]
    if enabled {
        return Arc::new(projtree_scan::GitVcsLookup::new());
    }
    let _ = enabled;
    Arc::new(NoVcs)
}

/// Scan, build the project tree and print it.
fn run_tree(config: ScanConfig, options: &TreeOptions) -> Result<()> {
    let vcs = vcs_lookup(options.vcs);
    let outcome = scan(config, vcs.clone(), options)?;

    if outcome.cancelled {
        bail!("Scan was cancelled");
    }

    let mut tree = ProjectTree::new();
    let project = tree.insert(Node::project(&outcome.root, DefaultProjectManager));
    tree.add_node(tree.root(), project)?;
    tree.add_nested_nodes(project, outcome.files, Some(outcome.root.as_path()), &mut |path: &Path| {
        Node::folder(path)
    })?;
    if options.compress {
        tree.compress(project)?;
    }
    for folder in tree.find_nodes(tree.root(), |_, node| node.is_folder()) {
        tree.sort_children(folder);
    }

    match options.format {
        OutputFormat::Text => {
            let topic = tree.vcs_topic(project, vcs.as_ref());
            let name = tree
                .get(project)
                .map(|node| node.display_name().into_owned())
                .unwrap_or_default();
            if topic.is_empty() {
                println!("{name}");
            } else {
                println!("{name} [{topic}]");
            }
            print_children(&tree, project, "");

            println!();
            println!(
                "{} files in {:.2}s",
                tree.find_nodes(project, |_, node| node.is_file()).len(),
                outcome.duration.as_secs_f64()
            );
            if !outcome.warnings.is_empty() {
                println!("{} warning(s) during scan", outcome.warnings.len());
            }
        }
        OutputFormat::Json => {
            let snapshot = tree.snapshot(project);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

/// Run the scan on a background worker, optionally reporting progress.
fn scan(config: ScanConfig, vcs: Arc<dyn VcsLookup>, options: &TreeOptions) -> Result<ScanOutcome> {
    let database = ExtensionMimeDatabase::new();
    let known_only = options.known_only;
    let classify = move |path: &Path| {
        let file_type = FileType::for_file_name(path, &database);
        if known_only && file_type == FileType::Unknown {
            return None;
        }
        Some(Node::file(path, file_type, false))
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let show_progress = options.progress;
    let outcome = runtime.block_on(async move {
        let mut handle = start_scan(FileScanner::with_vcs(vcs), config, classify);
        while let Some(event) = handle.recv().await {
            match event {
                ScanEvent::Progress(progress) if show_progress => {
                    eprint!("\rScanning... {:>3.0}%", progress.fraction() * 100.0);
                    let _ = std::io::stderr().flush();
                }
                ScanEvent::Progress(_) => {}
                ScanEvent::Complete(result) => {
                    if show_progress {
                        eprintln!();
                    }
                    return result.context("Scan failed");
                }
            }
        }
        Err(eyre!("Scan ended without a result"))
    })?;

    Ok(outcome)
}

/// Print the children of a node with box-drawing branches.
fn print_children(tree: &ProjectTree, id: NodeId, prefix: &str) {
    for (position, &child) in tree.children(id).iter().with_position() {
        let Some(node) = tree.get(child) else {
            continue;
        };
        let last = matches!(position, Position::Last | Position::Only);
        let branch = if last { "└── " } else { "├── " };
        let marker = if node.is_folder() { "/" } else { "" };
        let line = node.line().map(|line| format!(":{line}")).unwrap_or_default();
        println!("{prefix}{branch}{}{marker}{line}", node.display_name());

        if node.is_folder() {
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            print_children(tree, child, &child_prefix);
        }
    }
}

/// Classify paths by MIME type.
fn run_classify(paths: &[PathBuf], format: OutputFormat) -> Result<()> {
    let database = ExtensionMimeDatabase::new();
    let kinds: Vec<(String, FileType)> = paths
        .iter()
        .map(|path| {
            (
                path.display().to_string(),
                FileType::for_file_name(path, &database),
            )
        })
        .collect();

    match format {
        OutputFormat::Text => {
            let width = kinds.iter().map(|(path, _)| path.len()).max().unwrap_or(0);
            for (path, kind) in &kinds {
                println!("{path:<width$}  {kind}");
            }
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = kinds
                .into_iter()
                .map(|(path, kind)| (path, serde_json::Value::String(kind.to_string())))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
    }

    Ok(())
}
