//! Administrative command handlers.
//!
//! Each command opens the configured database, applies pending migrations,
//! and performs one store operation without starting the HTTP listener.

#![expect(
    clippy::print_stdout,
    reason = "intentional user output for CLI commands"
)]

use anyhow::{Context, Result, anyhow};
use ortho_config::load_and_merge_subcommand_for;

use super::{
    cli::{AddDonorArgs, AppConfig, Commands, InsertInsultArgs, RemoveDonorArgs},
    daemon::setup_database,
};
use crate::{donors::IdentityStore, insults::ModerationEngine, models::Donor};

/// Execute an administrative command.
///
/// # Errors
///
/// Propagates failures from configuration merging, missing arguments, or
/// database operations.
pub async fn run_command(command: Commands, cfg: &AppConfig) -> Result<()> {
    match command {
        Commands::AddDonor(args) => {
            let args = load_and_merge_subcommand_for::<AddDonorArgs>(&args)?;
            run_add_donor(args, cfg).await
        }
        Commands::RemoveDonor(args) => {
            let args = load_and_merge_subcommand_for::<RemoveDonorArgs>(&args)?;
            run_remove_donor(args, cfg).await
        }
        Commands::ListDonors => run_list_donors(cfg).await,
        Commands::InsertInsult(args) => {
            let args = load_and_merge_subcommand_for::<InsertInsultArgs>(&args)?;
            run_insert_insult(args, cfg).await
        }
    }
}

async fn run_add_donor(args: AddDonorArgs, cfg: &AppConfig) -> Result<()> {
    let name = args.name.ok_or_else(|| anyhow!("missing name"))?;
    let email = args.email.ok_or_else(|| anyhow!("missing email"))?;

    let store = IdentityStore::new(setup_database(&cfg.database).await?);
    let (code, outcome) = store
        .issue_code(&name, &email, args.code.as_deref(), args.admin)
        .await
        .with_context(|| format!("failed to add donor '{email}'"))?;
    println!("Donor {email} {outcome}: {code}");
    Ok(())
}

async fn run_remove_donor(args: RemoveDonorArgs, cfg: &AppConfig) -> Result<()> {
    let email = args.email.ok_or_else(|| anyhow!("missing email"))?;

    let store = IdentityStore::new(setup_database(&cfg.database).await?);
    if !store.remove_donor(&email).await? {
        return Err(anyhow!("no donor registered for '{email}'"));
    }
    println!("Donor {email} removed");
    Ok(())
}

fn donor_line(donor: &Donor) -> String {
    let role = if donor.is_admin { "admin" } else { "donor" };
    format!(
        "{}\t{}\t{}\t{}\t{}",
        donor.created_at.format("%Y-%m-%d %H:%M:%S"),
        donor.email,
        donor.name,
        role,
        donor.code
    )
}

async fn run_list_donors(cfg: &AppConfig) -> Result<()> {
    let store = IdentityStore::new(setup_database(&cfg.database).await?);
    for donor in store.list_all().await? {
        println!("{}", donor_line(&donor));
    }
    Ok(())
}

async fn run_insert_insult(args: InsertInsultArgs, cfg: &AppConfig) -> Result<()> {
    let text = args.text.ok_or_else(|| anyhow!("missing text"))?;

    let engine = ModerationEngine::new(setup_database(&cfg.database).await?);
    let submission = engine
        .insert_approved(&text)
        .await
        .context("failed to publish insult")?;
    println!("Insult {} published", submission.id);
    Ok(())
}
