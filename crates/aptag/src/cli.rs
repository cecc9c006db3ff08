//! Clap derive structures for the `aptag` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aptag -- assign Catalyst 9800 AP tags from MQTT announcements
#[derive(Debug, Parser)]
#[command(
    name = "aptag",
    version,
    about = "Provision Catalyst 9800 AP tags from MQTT announcements",
    long_about = "Subscribes to an MQTT topic carrying {\"MAC\": ..., \"WLC\": ...} \
        announcements and pushes the mapped policy/site/RF tags to the named \
        wireless controller over NETCONF, then saves its configuration.\n\n\
        Controller credentials are read from WLC_USER and WLC_PASSWORD.",
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
    /// Path to the JSON config file
    #[arg(
        long,
        short = 'c',
        env = "APTAG_CONFIG",
        default_value = "config.json",
        global = true
    )]
    pub config: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Subscribe and provision APs until interrupted
    Run,

    /// Validate the config file and credentials, then exit
    Check,

    /// Print the NETCONF payloads that would be sent for one AP
    Render(RenderArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// AP Ethernet MAC, exactly as it appears in ap-tag-map
    #[arg(long)]
    pub mac: String,

    /// Controller name; also resolves the session address
    #[arg(long)]
    pub wlc: Option<String>,
}
