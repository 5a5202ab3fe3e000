//! Command-line and configuration loading for the `snippy` binary.
//!
//! The clap and `OrthoConfig` types live in the `cli-defs` crate so that
//! `build.rs` can render the manual page from them. This module layers the
//! environment and dotfile sources over the parsed arguments.

use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::Parser;
use ortho_config::OrthoConfig;
pub use cli_defs::{AddDonorArgs, AppConfig, Cli, Commands, InsertInsultArgs, RemoveDonorArgs};

const SUBCOMMANDS: [&str; 4] = ["add-donor", "remove-donor", "list-donors", "insert-insult"];

/// Index of the first subcommand token, or the argument count when there is
/// none.
fn global_args_end(args: &[OsString]) -> usize {
    args.iter()
        .skip(1)
        .position(|arg| arg.to_str().is_some_and(|a| SUBCOMMANDS.contains(&a)))
        .map_or(args.len(), |i| i + 1)
}

/// Parse `args` and merge `SNIPPY_*` variables and `.snippy.toml` into the
/// global configuration.
///
/// Command-line values take precedence over the environment, which takes
/// precedence over the dotfile.
///
/// # Errors
///
/// Returns an error if the arguments do not parse or a configuration source
/// is malformed.
pub fn load_cli<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let mut cli = Cli::try_parse_from(&args)?;
    let globals = args.get(..global_args_end(&args)).unwrap_or(&args);
    cli.config = AppConfig::load_from_iter(globals.iter().cloned())
        .context("failed to load configuration")?;
    Ok(cli)
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use rstest::rstest;

    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> { args.iter().map(OsString::from).collect() }

    #[rstest]
    #[case(&["snippy"], 1)]
    #[case(&["snippy", "--bind", "127.0.0.1:1"], 3)]
    #[case(&["snippy", "--database", "x.db", "add-donor", "--name", "A"], 3)]
    #[case(&["snippy", "list-donors"], 1)]
    fn finds_global_args(#[case] args: &[&str], #[case] expected: usize) {
        assert_eq!(global_args_end(&os(args)), expected);
    }

    #[rstest]
    fn environment_fills_global_config() {
        Jail::expect_with(|j| {
            j.set_env("SNIPPY_ADMIN_SECRET", "from-env");
            j.set_env("SNIPPY_DATABASE", "env.db");
            let cli = load_cli(["snippy", "--database", "cli.db", "list-donors"]).expect("load");
            assert_eq!(cli.config.database, "cli.db");
            assert_eq!(cli.config.admin_secret.as_deref(), Some("from-env"));
            assert!(matches!(cli.command, Some(Commands::ListDonors)));
            Ok(())
        });
    }

    #[rstest]
    fn subcommand_args_are_parsed() {
        Jail::expect_with(|_j| {
            let cli = load_cli([
                "snippy",
                "add-donor",
                "--name",
                "Dana",
                "--email",
                "dana@example.com",
                "--admin",
            ])
            .expect("load");
            let Some(Commands::AddDonor(args)) = cli.command else {
                panic!("expected add-donor");
            };
            assert_eq!(args.name.as_deref(), Some("Dana"));
            assert!(args.admin);
            Ok(())
        });
    }
}
