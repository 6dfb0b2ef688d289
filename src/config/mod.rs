//! Project configuration and the generated-project manifest.
//!
//! # Core Concepts
//!
//! [`ProjectConfig`] is everything collected up front (name plus database
//! connection settings); it lives only for the duration of the `new` run.
//! [`ProjectManifest`] is the durable subset written to `stackgen.json` in
//! the generated project root so that `stackgen serve` can later find the
//! two service trees and their readiness markers. Credentials are never
//! persisted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::devserver::{ANGULAR_READY_MARKER, LARAVEL_READY_MARKER};

/// File name of the manifest inside a generated project root.
pub const MANIFEST_FILE: &str = "stackgen.json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the project name cannot be empty")]
    EmptyName,
    #[error("the project name can only contain lowercase letters, digits and dashes")]
    InvalidNameChars,
    #[error("the project name must be at least 3 characters long")]
    NameTooShort,
    #[error("the database name cannot be empty")]
    EmptyDatabaseName,
    #[error("the database name can only contain lowercase letters, digits and underscores")]
    InvalidDatabaseNameChars,
}

/// Project names become directory names and npm package names: 3+ chars of
/// lowercase letters, digits and dashes.
pub fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidNameChars);
    }
    if name.len() < 3 {
        return Err(ValidationError::NameTooShort);
    }
    Ok(())
}

/// Database names are interpolated into SQL statements; restricting them to
/// `[a-z0-9_]+` keeps that safe.
pub fn validate_database_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyDatabaseName);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::InvalidDatabaseNameChars);
    }
    Ok(())
}

/// Default database name derived from the project name.
pub fn default_database_name(project_name: &str) -> String {
    format!("{}_db", project_name.replace('-', "_"))
}

/// Connection settings for the project database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
}

/// Everything collected before scaffolding starts.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub project_name: String,
    pub database: DatabaseConfig,
}

impl ProjectConfig {
    pub fn backend_dir_name(&self) -> String {
        format!("{}-backend", self.project_name)
    }

    pub fn frontend_dir_name(&self) -> String {
        format!("{}-frontend", self.project_name)
    }

    pub fn project_root(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.project_name)
    }
}

/// Written into the generated project root; `stackgen serve` reads it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub project_name: String,
    /// Display name of the project database.
    pub database: String,
    pub backend_dir: String,
    pub frontend_dir: String,
    #[serde(default = "default_backend_marker")]
    pub backend_ready_marker: String,
    #[serde(default = "default_frontend_marker")]
    pub frontend_ready_marker: String,
}

fn default_backend_marker() -> String {
    LARAVEL_READY_MARKER.to_string()
}

fn default_frontend_marker() -> String {
    ANGULAR_READY_MARKER.to_string()
}

impl ProjectManifest {
    pub fn for_project(config: &ProjectConfig) -> Self {
        Self {
            project_name: config.project_name.clone(),
            database: config.database.name.clone(),
            backend_dir: config.backend_dir_name(),
            frontend_dir: config.frontend_dir_name(),
            backend_ready_marker: default_backend_marker(),
            frontend_ready_marker: default_frontend_marker(),
        }
    }

    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("no project manifest at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid project manifest at {}", path.display()))
    }

    pub fn store(&self, project_root: &Path) -> Result<()> {
        let path = project_root.join(MANIFEST_FILE);
        let raw = serde_json::to_string_pretty(self).context("could not encode the manifest")?;
        std::fs::write(&path, raw)
            .with_context(|| format!("could not write {}", path.display()))?;
        Ok(())
    }

    pub fn backend_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.backend_dir)
    }

    pub fn frontend_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.frontend_dir)
    }
}
