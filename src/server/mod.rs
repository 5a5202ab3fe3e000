//! Server orchestration for the `snippy` binary.
//!
//! This module exposes the command-line interface, the administrative
//! commands, and the HTTP daemon. The binary stays a thin wrapper that only
//! needs to call [`run`].

pub mod admin;
pub mod cli;
pub mod daemon;
pub mod http;

use anyhow::Result;
pub use admin::run_command;
pub use cli::{AppConfig, Cli, Commands, load_cli};
pub use daemon::{run_daemon, setup_database};

/// Parse process arguments and execute the requested command or daemon.
///
/// # Errors
///
/// Returns any error emitted while loading configuration or running the
/// command or daemon.
pub async fn run() -> Result<()> {
    let cli = load_cli(std::env::args_os())?;
    run_with_cli(cli).await
}

/// Execute the server logic using an already loaded [`Cli`].
///
/// # Errors
///
/// Propagates any failure reported by [`run_command`] or [`run_daemon`].
pub async fn run_with_cli(cli: Cli) -> Result<()> {
    let Cli { config, command } = cli;
    if let Some(command) = command {
        run_command(command, &config).await
    } else {
        run_daemon(config).await
    }
}
