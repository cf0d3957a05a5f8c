//! Droplabel: build labeled image datasets from whatever gets dropped on it.
//!
//! Droplabel takes a raw drag-and-drop or clipboard payload (a file path, a
//! URL, a chunk of HTML), works out which image it denotes, unwinds indirect
//! links down to the image bytes, and saves accepted images with their labels
//! into an append-only dataset.
//!
//! # Modules
//!
//! - [`source`]: classify raw payloads into references
//! - [`resolve`]: unwind wiki pages, redirect wrappers and HTML pages
//! - [`fetch`]: read and decode images
//! - [`catalog`]: the persistent label vocabulary
//! - [`store`]: ordinal image files and the annotation log
//! - [`session`]: the load/commit context object
//! - [`stats`]: dataset statistics
//! - [`error`]: error types for droplabel operations

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod resolve;
pub mod session;
pub mod source;
pub mod stats;
pub mod store;

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use error::DroplabelError;

use config::Config;
use session::{Session, SessionState};

/// The droplabel CLI application.
#[derive(Parser)]
#[command(name = "droplabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every subcommand.
#[derive(clap::Args)]
struct GlobalArgs {
    /// Label catalog file.
    #[arg(long, global = true, env = "DROPLABEL_LABELS", default_value = config::DEFAULT_LABELS_FILE)]
    labels: PathBuf,

    /// Annotation log file.
    #[arg(long, global = true, env = "DROPLABEL_ANNOTATIONS", default_value = config::DEFAULT_ANNOTATIONS_FILE)]
    annotations: PathBuf,

    /// Directory receiving saved images.
    #[arg(long, global = true, env = "DROPLABEL_OUTPUT_DIR", default_value = config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// File that publishes the absolute output directory.
    #[arg(long, global = true, env = "DROPLABEL_FOLDER_FILE", default_value = config::DEFAULT_FOLDER_FILE)]
    folder_file: PathBuf,

    /// Timeout for each HTTP request, in seconds.
    #[arg(long, global = true, env = "DROPLABEL_TIMEOUT_SECS", default_value_t = 15)]
    timeout_secs: u64,

    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl GlobalArgs {
    fn to_config(&self) -> Config {
        Config {
            labels_path: self.labels.clone(),
            annotations_path: self.annotations.clone(),
            output_dir: self.output_dir.clone(),
            folder_path_file: self.folder_file.clone(),
            http_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            ..Config::default()
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show what a raw payload refers to.
    Classify {
        /// Dropped or pasted text.
        input: String,
    },

    /// Resolve an indirect URL to a direct image URL.
    Resolve {
        url: String,
    },

    /// Load an image and print its size and origin.
    Fetch {
        /// Dropped or pasted text.
        input: String,
    },

    /// Load an image and save it with labels in one step.
    Save(SaveArgs),

    /// Inspect or extend the label catalog.
    #[command(subcommand)]
    Labels(LabelsCommand),

    /// Print the path the next saved image will get.
    NextFilename,

    /// Show dataset statistics.
    Stats {
        /// Output format ('text' or 'json').
        #[arg(long, default_value = "text")]
        output: String,
    },

    /// Interactive session: each stdin line is a payload or a ':' command.
    Annotate,
}

/// Arguments for the save subcommand.
#[derive(clap::Args)]
struct SaveArgs {
    /// Dropped or pasted text.
    input: String,

    /// Label to assign (repeatable; must exist in the catalog).
    #[arg(id = "label_names", value_name = "LABELS", short, long = "label", required = true)]
    labels: Vec<String>,
}

#[derive(Subcommand)]
enum LabelsCommand {
    /// List catalog labels in order.
    List,
    /// Add a label to the catalog.
    Add { label: String },
}

/// Run the droplabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DroplabelError> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    let config = cli.global.to_config();

    match cli.command {
        Some(Commands::Classify { input }) => run_classify(&input),
        Some(Commands::Resolve { url }) => run_resolve(&config, &url),
        Some(Commands::Fetch { input }) => run_fetch(&config, &input),
        Some(Commands::Save(args)) => run_save(&config, args),
        Some(Commands::Labels(command)) => run_labels(&config, command),
        Some(Commands::NextFilename) => run_next_filename(&config),
        Some(Commands::Stats { output }) => run_stats(&config, &output),
        Some(Commands::Annotate) => run_annotate(&config),
        None => {
            println!("droplabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Resolve dropped images and record their labels.");
            println!();
            println!("Run 'droplabel --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "droplabel=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_classify(input: &str) -> Result<(), DroplabelError> {
    match source::classify(input) {
        source::Reference::Unresolvable => Err(DroplabelError::Unresolvable {
            input: input.to_string(),
        }),
        reference => {
            println!("{}", reference);
            Ok(())
        }
    }
}

fn run_resolve(config: &Config, url: &str) -> Result<(), DroplabelError> {
    let http = config.http_client();
    let resolution = resolve::Resolver::default().resolve(url, &http);
    for warning in &resolution.warnings {
        eprintln!("warning: {}", warning);
    }
    println!("{}", resolution.url);
    Ok(())
}

fn run_fetch(config: &Config, input: &str) -> Result<(), DroplabelError> {
    let http = config.http_client();
    let image = session::load_image(input, &resolve::Resolver::default(), &http)?;
    println!(
        "{}x{} from {}",
        image.width(),
        image.height(),
        image.provenance()
    );
    Ok(())
}

fn run_save(config: &Config, args: SaveArgs) -> Result<(), DroplabelError> {
    let mut session = Session::open(config)?;
    session.load(&args.input)?;
    let record = session.commit(&args.labels)?;
    println!(
        "Saved {} [{}]",
        record.image_path.display(),
        record.labels.join(", ")
    );
    Ok(())
}

fn run_labels(config: &Config, command: LabelsCommand) -> Result<(), DroplabelError> {
    let mut catalog = catalog::LabelCatalog::load(&config.labels_path)?;
    match command {
        LabelsCommand::List => {
            for label in catalog.labels() {
                println!("{}", label);
            }
        }
        LabelsCommand::Add { label } => {
            let added = catalog.add(&label)?;
            println!("Added label '{}' ({} total)", added, catalog.len());
        }
    }
    Ok(())
}

fn run_next_filename(config: &Config) -> Result<(), DroplabelError> {
    let store = store::AnnotationStore::open(&config.output_dir, &config.annotations_path)?;
    println!("{}", store.next_filename()?.display());
    Ok(())
}

fn run_stats(config: &Config, output: &str) -> Result<(), DroplabelError> {
    let catalog = catalog::LabelCatalog::load(&config.labels_path)?;
    let report = stats::dataset_stats(
        &config.annotations_path,
        &config.output_dir,
        &catalog,
        &stats::StatsOptions::default(),
    )?;

    match output {
        "json" => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| DroplabelError::Io(e.into()))?;
            println!("{}", json);
        }
        "text" => print!("{}", report),
        other => {
            return Err(DroplabelError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            )));
        }
    }
    Ok(())
}

/// Line-oriented stand-in for the drop target.
fn run_annotate(config: &Config) -> Result<(), DroplabelError> {
    let mut session = Session::open(config)?;
    let stdin = std::io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.strip_prefix(':') {
            Some(cmd) => cmd.split_once(' ').unwrap_or((cmd, "")),
            None => ("load", line),
        };

        let result = match command {
            "q" | "quit" => break,
            "load" => session.load(rest).map(|image| {
                println!(
                    "Loaded {}x{} from {}",
                    image.width(),
                    image.height(),
                    image.provenance()
                );
            }),
            "add" => session
                .add_label(rest)
                .map(|label| println!("Added label '{}'", label)),
            "labels" => {
                for label in session.catalog().labels() {
                    println!("{}", label);
                }
                Ok(())
            }
            "commit" => {
                let selected: Vec<&str> = rest
                    .split(catalog::LABEL_SEPARATOR)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                session.commit(&selected).map(|record| {
                    println!(
                        "Saved {} [{}]",
                        record.image_path.display(),
                        record.labels.join(", ")
                    );
                })
            }
            "status" => {
                match (session.state(), session.active_image()) {
                    (SessionState::Loaded, Some(image)) => {
                        println!("loaded: {}", image.provenance())
                    }
                    _ => println!("idle"),
                }
                Ok(())
            }
            other => Err(DroplabelError::UnsupportedFormat(format!(
                "unknown command ':{}' (supported: add, labels, commit, status, quit)",
                other
            ))),
        };

        if let Err(err) = result {
            eprintln!("error: {}", err);
        }
    }
    Ok(())
}
