//! Clap derive structures for the `dockboard` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use dockboard_config::Defaults;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dockboard -- Docker dashboard for Home Assistant
#[derive(Debug, Parser)]
#[command(
    name = "dockboard",
    version,
    about = "Manage Docker containers, images and volumes through Home Assistant",
    long_about = "Renders the Docker dashboard of a Home Assistant host in the terminal.\n\n\
        Containers, images and volumes are discovered from the host's device and\n\
        entity registries; actions go through the Docker integration's services.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Host profile to use
    #[arg(long, short = 'p', env = "DOCKBOARD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "DOCKBOARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Host URL (overrides profile)
    #[arg(long, short = 'u', env = "DOCKBOARD_URL", global = true)]
    pub url: Option<String>,

    /// Long-lived access token (overrides profile, env and keyring)
    #[arg(long, global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format [default: table]
    #[arg(long, short = 'o', env = "DOCKBOARD_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DOCKBOARD_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DOCKBOARD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Fail when the registry has no image or volume device
    #[arg(long, global = true)]
    pub strict: bool,

    /// List inactive resources by default (from `[defaults]`)
    #[arg(skip)]
    pub show_inactive: bool,
}

impl GlobalOpts {
    /// Fill options the command line left unset from the config file.
    pub fn apply_defaults(&mut self, defaults: &Defaults) {
        if self.output.is_none() {
            self.output = OutputFormat::from_str(&defaults.output, true).ok();
        }
        if self.color.is_none() {
            self.color = ColorMode::from_str(&defaults.color, true).ok();
        }
        self.strict |= defaults.strict_models;
        self.show_inactive |= defaults.show_inactive;
    }

    pub fn output(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }

    pub fn color(&self) -> ColorMode {
        self.color.unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the synthesized dashboard description
    View(ViewArgs),

    /// Manage containers
    #[command(alias = "ct", alias = "c")]
    Containers(ContainersArgs),

    /// List images
    #[command(alias = "img", alias = "i")]
    Images(ResourceArgs),

    /// List volumes
    #[command(alias = "vol")]
    Volumes(ResourceArgs),

    /// Remove stopped containers, unused images or unused volumes
    Prune(PruneArgs),

    /// Follow state changes and report affected rows
    Watch(WatchArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Include stopped containers / unused images and volumes
    #[arg(long, short = 'a')]
    pub all: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VIEW
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Print the partitioned items instead of the card layout
    #[arg(long)]
    pub items: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONTAINERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ContainersArgs {
    #[command(subcommand)]
    pub command: ContainersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ContainersCommand {
    /// List containers, grouped by compose project
    #[command(alias = "ls")]
    List(ListArgs),

    /// Start a container
    Start {
        /// Container id or name
        container: String,
    },

    /// Stop a container
    Stop {
        /// Container id or name
        container: String,
    },

    /// Restart a container
    Restart {
        /// Container id or name
        container: String,
    },

    /// Remove a container (asks for confirmation)
    #[command(alias = "rm")]
    Remove {
        /// Container id or name
        container: String,
    },

    /// Show a container's logs
    Logs {
        /// Container id or name
        container: String,
    },

    /// Create a container (prompts for anything not given)
    Create(CreateArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Image reference (e.g. nginx:latest)
    #[arg(long)]
    pub image: Option<String>,

    /// Container name
    #[arg(long)]
    pub name: Option<String>,

    /// Network to attach
    #[arg(long)]
    pub network: Option<String>,

    /// Port mapping host:container[/proto] (repeatable)
    #[arg(long = "port")]
    pub ports: Vec<String>,

    /// Mount source:target[:mode] (repeatable)
    #[arg(long = "volume")]
    pub volumes: Vec<String>,

    /// Restart policy (no, always, on-failure, unless-stopped)
    #[arg(long)]
    pub restart_policy: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  IMAGES / VOLUMES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// List resources; unused ones only with --all
    #[command(alias = "ls")]
    List(ListArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PRUNE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// What to prune
    pub target: PruneTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PruneTarget {
    Containers,
    Images,
    Volumes,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many row updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Store an access token in the system keyring for the active profile
    SetToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
