//! Database administration through the `mysql` client.
//!
//! The generator never links a database driver. The MySQL client binary is
//! already a required toolchain dependency, so the connection ping and the
//! create-if-missing step drive it as a child process. Credentials travel
//! through `MYSQL_PWD` so they never appear in a process listing.

use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("could not run the mysql client: {0}")]
    ClientUnavailable(#[source] std::io::Error),

    #[error("could not connect to MySQL at {host} as {user}: {details}")]
    ConnectionFailed {
        host: String,
        user: String,
        details: String,
    },

    #[error("statement failed: {0}")]
    StatementFailed(String),
}

/// Outcome of [`ensure_database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyExisted,
}

/// Check that the server is reachable and accepts the credentials.
pub async fn ping(config: &DatabaseConfig) -> Result<(), DatabaseError> {
    let output = run_statement(config, "SELECT 1").await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(DatabaseError::ConnectionFailed {
            host: config.host.clone(),
            user: config.user.clone(),
            details: stderr_text(&output),
        })
    }
}

/// Whether the configured database already exists.
pub async fn database_exists(config: &DatabaseConfig) -> Result<bool, DatabaseError> {
    let sql = format!("SHOW DATABASES LIKE '{}'", config.name);
    let output = run_statement(config, &sql).await?;
    if !output.status.success() {
        return Err(DatabaseError::StatementFailed(stderr_text(&output)));
    }
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Create the database when missing. The name has already been validated to
/// `[a-z0-9_]+`, which keeps it safe to interpolate.
pub async fn ensure_database(config: &DatabaseConfig) -> Result<EnsureOutcome, DatabaseError> {
    if database_exists(config).await? {
        return Ok(EnsureOutcome::AlreadyExisted);
    }

    let sql = format!(
        "CREATE DATABASE IF NOT EXISTS `{}` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci",
        config.name
    );
    let output = run_statement(config, &sql).await?;
    if output.status.success() {
        Ok(EnsureOutcome::Created)
    } else {
        Err(DatabaseError::StatementFailed(stderr_text(&output)))
    }
}

async fn run_statement(
    config: &DatabaseConfig,
    sql: &str,
) -> Result<std::process::Output, DatabaseError> {
    debug!(host = %config.host, user = %config.user, sql, "running mysql statement");
    Command::new("mysql")
        .arg("--host")
        .arg(&config.host)
        .arg("--user")
        .arg(&config.user)
        .arg("--batch")
        .arg("--skip-column-names")
        .arg("--execute")
        .arg(sql)
        .env("MYSQL_PWD", &config.password)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(DatabaseError::ClientUnavailable)
}

fn stderr_text(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
