// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! badge-perms developer CLI.
//!
//! Loads permission records and timelines from JSON files, runs them through
//! the engine, and reports decisions. Rejected transitions exit non-zero.

mod commands;
mod output;

use std::path::{Path, PathBuf};

use anyhow::Result;
use badge_app_core::settings::{
    EngineSettings, SettingsOverrides, SettingsService, UnconstrainedPolicy,
};
use badge_config_fs::FsConfigStore;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "badge-perms",
    author,
    version,
    about = "Inspect and validate badge permission collections"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Cap on shrinking-walk iterations (overrides saved settings).
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Cap on fragments per compilation or resolution (overrides saved settings).
    #[arg(long, global = true)]
    max_fragments: Option<usize>,

    /// How to treat decisions no rule constrains (overrides saved settings).
    #[arg(long, global = true, value_enum)]
    policy: Option<PolicyArg>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Directory for `engine.json` instead of the platform config dir.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a scenario's records and answer its point or region query.
    Check {
        /// Scenario JSON: `records`, `now`, and `point` or `region`.
        scenario: PathBuf,
    },
    /// Print the first-match partition of a record list.
    Compile {
        /// Record list JSON.
        records: PathBuf,
    },
    /// Diff two timelines and validate the change against permissions.
    Diff(DiffArgs),
    /// Diff two badge metadata timelines and validate per badge.
    MetadataDiff(DiffArgs),
    /// Reject a permission update that drops permanent locks.
    ValidateUpdate {
        /// Current record list JSON.
        old: PathBuf,
        /// Proposed record list JSON.
        new: PathBuf,
    },
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Current timeline JSON.
    old: PathBuf,
    /// Proposed timeline JSON.
    new: PathBuf,
    /// Update permission records JSON.
    #[arg(long)]
    permissions: PathBuf,
    /// Instant the update is applied at.
    #[arg(long)]
    now: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Allow,
    Deny,
}

impl From<PolicyArg> for UnconstrainedPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Allow => Self::Allow,
            PolicyArg::Deny => Self::Deny,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let settings = resolve_settings(&cli.global);
    debug!(?settings, "engine settings");
    let ctx = commands::Context {
        limits: settings.limits(),
        policy: settings.unconstrained_policy,
        format: cli.global.format,
    };

    match &cli.command {
        Command::Check { scenario } => commands::check(&ctx, scenario),
        Command::Compile { records } => commands::compile(&ctx, records),
        Command::Diff(args) => {
            commands::diff(&ctx, &args.old, &args.new, &args.permissions, args.now)
        }
        Command::MetadataDiff(args) => {
            commands::metadata_diff(&ctx, &args.old, &args.new, &args.permissions, args.now)
        }
        Command::ValidateUpdate { old, new } => commands::validate_update(&ctx, old, new),
    }
}

/// Saved settings (best-effort) with flag overrides applied.
fn resolve_settings(global: &GlobalArgs) -> EngineSettings {
    let overrides = SettingsOverrides {
        max_iterations: global.max_iterations,
        max_fragments: global.max_fragments,
        unconstrained_policy: global.policy.map(Into::into),
    };
    overrides.apply(load_saved_settings(global.config_dir.as_deref()).unwrap_or_default())
}

// Persists defaults once if absent; any store failure falls back to defaults.
fn load_saved_settings(config_dir: Option<&Path>) -> Option<EngineSettings> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::platform(),
    };
    let service = match store {
        Ok(store) => SettingsService::new(store),
        Err(err) => {
            warn!(%err, "config store unavailable; using default settings");
            return None;
        }
    };
    match service.load() {
        Ok(settings) => Some(settings),
        Err(err) => {
            warn!(%err, "could not load engine settings; using defaults");
            None
        }
    }
}
