//! Clap derive structures for the `cudy` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cudy -- monitor and control Cudy routers from the command line
#[derive(Debug, Parser)]
#[command(
    name = "cudy",
    version,
    about = "Monitor and control Cudy routers from the command line",
    long_about = "Reads status from a Cudy router's LuCI web interface (modem, clients,\n\
        Wi-Fi, mesh, WAN, DHCP, VPN, data usage, SMS) and drives its actions:\n\
        reboot, modem reset, band switching, SMS, AT commands, and mesh control.",
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
    /// Router profile to use
    #[arg(long, short = 'p', env = "CUDY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router address, bare host or URL (overrides profile)
    #[arg(long, short = 'H', env = "CUDY_HOST", global = true)]
    pub host: Option<String>,

    /// Login user (overrides profile)
    #[arg(long, short = 'u', env = "CUDY_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CUDY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

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
    #[arg(long, short = 'k', env = "CUDY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CUDY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
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
    /// Show polled router data, optionally for one module
    #[command(alias = "st")]
    Status(StatusArgs),

    /// List sensor, switch, and button entities with their state
    Sensors,

    /// List connected client devices
    #[command(alias = "dev")]
    Devices,

    /// Inspect and control mesh nodes
    Mesh(MeshArgs),

    /// Poll continuously and print each update
    Watch(WatchArgs),

    /// Reboot the router
    Reboot,

    /// Reset the cellular modem connection
    #[command(name = "restart-5g")]
    Restart5g,

    /// Switch the cellular band
    Band {
        /// Band value as offered by the router (e.g. "auto", "n78")
        band: String,
    },

    /// Send an SMS through the modem
    Sms {
        /// Recipient phone number
        phone: String,

        /// Message text
        message: String,
    },

    /// Run an AT command on the modem and print its reply
    At {
        /// AT command (e.g. "AT+CSQ")
        command: String,
    },

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Module to show: modem, devices, system, data_usage, sms, wifi_2g,
    /// wifi_5g, lan, mesh, vpn, wan, dhcp
    pub module: Option<String>,
}

// ── Mesh ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MeshArgs {
    #[command(subcommand)]
    pub command: MeshCommand,
}

#[derive(Debug, Subcommand)]
pub enum MeshCommand {
    /// List mesh nodes
    #[command(alias = "ls")]
    List,

    /// Reboot a mesh node
    Reboot {
        /// Node MAC address (with or without colons) or name
        node: String,
    },

    /// Show or set a mesh node's LED
    Led {
        /// Node MAC address (with or without colons) or name
        node: String,

        /// New LED state; omit to read the current one
        state: Option<LedState>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LedState {
    On,
    Off,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polls (clamped to 15..3600; default from profile)
    #[arg(long, short = 'i')]
    pub interval: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key: host, username, scan_interval, modules, device_list,
        /// model, insecure, timeout, ca_cert
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
