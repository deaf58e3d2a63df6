mod cmd;
mod logging;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use publish_core::config::loader::ConfigLoader;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "publish", version, about = "Build and release artifacts on a schedule")]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/publish/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover, build and copy every released artifact to an output directory
    Release(ReleaseArgs),

    /// Show when artifacts are scheduled to be released
    Calendar(CalendarArgs),
}

/// Options shared by every command that reads an input tree.
#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Input directory holding collections and publications
    pub input: PathBuf,

    /// Directory names ignored during discovery
    #[arg(long, num_args = 1..)]
    pub skip_directories: Vec<String>,

    /// Monday (or any day) that starts week one, for "<weekday> of week <n>" dates
    #[arg(long)]
    pub start_of_week_one: Option<NaiveDate>,

    /// Run as if this is the current time: a day offset or a datetime
    #[arg(long)]
    pub now: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReleaseArgs {
    #[command(flatten)]
    pub discover: DiscoverArgs,

    /// Output directory; created if missing
    pub output: PathBuf,

    /// Build and publish everything regardless of release time
    #[arg(long)]
    pub ignore_release_time: bool,

    /// Only build and publish artifacts with this key
    #[arg(long)]
    pub artifact_filter: Option<String>,

    /// Let recipe stdout and stderr through
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct CalendarArgs {
    #[command(flatten)]
    pub discover: DiscoverArgs,

    /// Include artifacts whose release time has passed
    #[arg(long)]
    pub show_published: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn main() {
    let cli = Cli::parse();

    let rc = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&rc);
    debug!(
        "publish-core v{} (config: {})",
        publish_core::version(),
        rc.source.as_ref().map_or_else(|| "defaults".to_string(), |p| p.display().to_string())
    );

    match cli.command {
        Commands::Release(args) => cmd::release::run(&rc, args),
        Commands::Calendar(args) => cmd::calendar::run(&rc, args),
    }
}
