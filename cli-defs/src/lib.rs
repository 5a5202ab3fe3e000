//! Shared CLI type definitions for snippy build and runtime.
//!
//! This crate provides CLI argument and configuration types used by both the
//! `build.rs` script (for man page generation) and the runtime binary.
//! Keeping them here lets the build script render the manual without pulling
//! the database and HTTP stacks into build-dependencies.

// FIXME: File-wide suppressions are unavoidable here. Clap and OrthoConfig derive macros
// inject generated code throughout the module, and there is no mechanism to narrow
// the scope without restructuring the crate.
#![expect(
    non_snake_case,
    reason = "Clap/OrthoConfig derive macros generate helper modules with uppercase names"
)]
#![expect(
    missing_docs,
    reason = "OrthoConfig and Clap derive macros generate items that cannot be documented"
)]

use clap::{Args, Parser, Subcommand};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
/// Default `SQLite` database path.
pub const DEFAULT_DATABASE: &str = "snippy.db";

/// Arguments for the `add-donor` administrative subcommand.
#[derive(Parser, OrthoConfig, Deserialize, Serialize, Default, Debug, Clone)]
#[ortho_config(prefix = "SNIPPY_")]
pub struct AddDonorArgs {
    /// Display name recorded for the donor.
    #[arg(long)]
    pub name: Option<String>,
    /// Email address identifying the donor.
    #[arg(long)]
    pub email: Option<String>,
    /// Unlock code to assign; a fresh one is generated when omitted.
    #[arg(long)]
    pub code: Option<String>,
    /// Grant the donor the admin flag.
    #[arg(long, default_value_t = false)]
    pub admin: bool,
}

/// Arguments for the `remove-donor` administrative subcommand.
#[derive(Parser, OrthoConfig, Deserialize, Serialize, Default, Debug, Clone)]
#[ortho_config(prefix = "SNIPPY_")]
pub struct RemoveDonorArgs {
    /// Email address of the donor to remove.
    #[arg(long)]
    pub email: Option<String>,
}

/// Arguments for the `insert-insult` administrative subcommand.
#[derive(Parser, OrthoConfig, Deserialize, Serialize, Default, Debug, Clone)]
#[ortho_config(prefix = "SNIPPY_")]
pub struct InsertInsultArgs {
    /// Insult text, published immediately under the bot identity.
    #[arg(long)]
    pub text: Option<String>,
}

/// CLI subcommands exposed by `snippy`.
#[derive(Subcommand, Deserialize, Serialize, Debug, Clone)]
pub enum Commands {
    /// Register a donor, or promote an existing one with `--admin`.
    #[command(name = "add-donor")]
    AddDonor(AddDonorArgs),
    /// Delete a donor by email.
    #[command(name = "remove-donor")]
    RemoveDonor(RemoveDonorArgs),
    /// Print every donor, newest first.
    #[command(name = "list-donors")]
    ListDonors,
    /// Publish an insult without moderation.
    #[command(name = "insert-insult")]
    InsertInsult(InsertInsultArgs),
}

/// Runtime configuration shared by the daemon and the admin subcommands.
///
/// The default bind address `0.0.0.0:3000` listens on all interfaces, which
/// is what the hosted deployment expects behind its proxy. Leave
/// `admin_secret` unset to disable every operator route.
#[derive(Args, OrthoConfig, Serialize, Deserialize, Default, Debug, Clone)]
#[ortho_config(prefix = "SNIPPY_")]
pub struct AppConfig {
    /// HTTP bind address.
    #[ortho_config(default = DEFAULT_BIND.to_owned())]
    #[arg(long, default_value_t = String::from(DEFAULT_BIND))]
    pub bind: String,
    /// Database connection string or path.
    #[ortho_config(default = DEFAULT_DATABASE.to_owned())]
    #[arg(long, default_value_t = String::from(DEFAULT_DATABASE))]
    pub database: String,
    /// Operator shared secret gating administrative routes.
    #[arg(long)]
    pub admin_secret: Option<String>,
    /// SMTP relay host for unlock-code mail. Codes are only logged when unset.
    #[arg(long)]
    pub smtp_host: Option<String>,
    /// SMTP port; the relay speaks implicit TLS, so 465 when unset.
    #[arg(long)]
    pub smtp_port: Option<u16>,
    #[arg(long)]
    pub smtp_user: Option<String>,
    #[arg(long)]
    pub smtp_password: Option<String>,
    /// Sender address. Falls back to `smtp_user`.
    #[arg(long)]
    pub smtp_from: Option<String>,
}

/// Top-level CLI entry point consumed by binaries.
#[derive(Parser, Deserialize, Serialize, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Application configuration.
    #[command(flatten)]
    pub config: AppConfig,
    /// Optional subcommand.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
