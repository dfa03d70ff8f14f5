use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skyform")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Plan and inspect declared cloud resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/skyform/config.toml)
    #[arg(long, global = true, env = "SKYFORM_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile the in-place patch between two pod attribute trees
    Plan(PlanArgs),

    /// Flatten remote pods into attribute trees, hiding injected volumes
    ReadPod(ReadPodArgs),

    /// Expand an attribute tree back into a remote pod spec
    Expand(ExpandArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plan
// ============================================================================

#[derive(Parser)]
pub struct PlanArgs {
    /// Prior attribute tree (JSON)
    #[arg(long)]
    pub prior: PathBuf,

    /// Desired attribute tree (JSON)
    #[arg(long)]
    pub desired: PathBuf,

    /// Attribute path of the pod spec block inside the trees
    #[arg(long)]
    pub prefix: Option<String>,

    /// Pointer prefix of emitted patch paths
    #[arg(long)]
    pub pointer: Option<String>,

    /// Print the patch as JSON only
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Pods
// ============================================================================

#[derive(Parser)]
pub struct ReadPodArgs {
    /// Remote pod document (JSON); repeat to read several pods
    #[arg(long = "pod", required = true)]
    pub pods: Vec<PathBuf>,

    /// Secret list of the namespace (JSON)
    #[arg(long)]
    pub secrets: PathBuf,

    /// Namespace used for the secret lookup (default: the pod's own)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Number of pods read in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}

#[derive(Parser)]
pub struct ExpandArgs {
    /// Pod spec attribute tree (JSON)
    #[arg(long)]
    pub tree: PathBuf,
}

// ============================================================================
// Config
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration, secrets masked
    Show,

    /// Print the config file location
    Path,
}
