//! HTTP daemon runtime.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
use url::Url;

use super::{
    cli::AppConfig,
    http::{AppState, router},
};
use crate::{
    access::OperatorSecret,
    db::{DbPool, apply_migrations, establish_pool},
    notify::{CodeNotifier, DEFAULT_SMTP_PORT, LogNotifier, SmtpNotifier, SmtpSettings},
};

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
fn is_postgres_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "postgres" | "postgresql"))
        .unwrap_or(false)
}

/// Build the connection pool, audit the backend and bring the schema up to
/// date.
///
/// # Errors
///
/// Returns an error if the pool cannot be built, the backend lacks a required
/// feature, or a migration fails.
pub async fn setup_database(database: &str) -> Result<DbPool> {
    #[cfg(all(feature = "postgres", not(feature = "sqlite")))]
    if !is_postgres_url(database) {
        anyhow::bail!("expected a postgres:// connection string, got '{database}'");
    }
    let pool = establish_pool(database)
        .await
        .with_context(|| format!("failed to open database '{database}'"))?;
    {
        let mut conn = pool.get().await.context("failed to get db connection")?;
        #[cfg(feature = "sqlite")]
        crate::db::audit_sqlite_features(&mut conn).await?;
        #[cfg(all(feature = "postgres", not(feature = "sqlite")))]
        crate::db::audit_postgres_features(&mut conn).await?;
        let applied = apply_migrations(&mut conn, database)
            .await
            .context("failed to apply migrations")?;
        info!(count = applied.len(), "database ready");
    }
    Ok(pool)
}

/// Serve the HTTP API until a shutdown signal arrives.
///
/// # Errors
///
/// Returns any failure reported while preparing the database, binding the
/// socket, or serving requests.
pub async fn run_daemon(cfg: AppConfig) -> Result<()> {
    let pool = setup_database(&cfg.database).await?;
    let operator = OperatorSecret::new(cfg.admin_secret.clone());
    if !operator.is_configured() {
        warn!("no admin secret configured; operator routes will refuse every request");
    }
    let state = AppState::new(pool, operator, code_notifier(&cfg)?);

    let listener = TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    info!(bind = %cfg.bind, "snippy listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server shutdown complete");
    Ok(())
}

/// Mail codes over SMTP when a relay is configured, otherwise only log them.
///
/// # Errors
///
/// Returns an error when a relay host is set without a usable sender address.
pub fn code_notifier(cfg: &AppConfig) -> Result<Arc<dyn CodeNotifier>> {
    let Some(host) = cfg.smtp_host.as_deref().map(str::trim).filter(|h| !h.is_empty()) else {
        warn!("no SMTP host configured; unlock codes will be logged, not mailed");
        return Ok(Arc::new(LogNotifier));
    };
    let from = cfg
        .smtp_from
        .clone()
        .or_else(|| cfg.smtp_user.clone())
        .context("smtp_from or smtp_user is required when smtp_host is set")?;
    let settings = SmtpSettings {
        host: host.to_owned(),
        port: cfg.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
        username: cfg.smtp_user.clone(),
        password: cfg.smtp_password.clone(),
        from,
    };
    let notifier = SmtpNotifier::new(&settings)
        .with_context(|| format!("failed to configure SMTP relay '{host}'"))?;
    info!(%host, port = settings.port, "mailing unlock codes over SMTP");
    Ok(Arc::new(notifier))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    res = tokio::signal::ctrl_c() => {
                        if let Err(err) = res {
                            warn!(%err, "failed to listen for Ctrl-C");
                        }
                    },
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(%err, "failed to install SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
    }
    info!("shutdown signal received");
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for Ctrl-C");
    }
}
