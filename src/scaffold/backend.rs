//! Laravel backend scaffolding.
//!
//! `composer create-project` builds the tree; afterwards the `.env` is
//! pointed at the project database, CORS is opened for the frontend origin,
//! and a small status API (health, database check, project info) is dropped
//! in so the generated frontend has something to talk to on first load.

use std::path::Path;

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use tokio::fs;

use crate::config::ProjectConfig;
use crate::ui;

use super::{run_quiet, run_step};

/// Create and configure the Laravel project under `backend_path`.
pub async fn setup_backend(backend_path: &Path, config: &ProjectConfig) -> Result<()> {
    ui::step("Creating Laravel project (composer create-project)");
    run_step(
        "composer create-project",
        None,
        "composer",
        &[
            "create-project",
            "laravel/laravel",
            &backend_path.display().to_string(),
            "--prefer-dist",
        ],
    )
    .await?;

    let pb = ui::spinner("Configuring Laravel...");
    configure_env(backend_path, config).await?;
    write_cors_config(backend_path).await?;
    write_database_controller(backend_path).await?;
    write_api_routes(backend_path).await?;

    pb.set_message("Installing CORS support...");
    if !run_quiet(backend_path, "composer", &["require", "fruitcake/laravel-cors"]).await? {
        pb.suspend(|| ui::warn("Could not install fruitcake/laravel-cors"));
    }

    pb.set_message("Generating application key...");
    if !run_quiet(backend_path, "php", &["artisan", "key:generate"]).await? {
        pb.suspend(|| ui::warn("Could not generate the application key"));
    }

    pb.set_message("Running migrations...");
    let migrated = run_quiet(backend_path, "php", &["artisan", "migrate"]).await?;
    pb.finish_and_clear();
    if !migrated {
        ui::warn("Could not run migrations; run `php artisan migrate` once MySQL is reachable");
    }

    ui::success("Laravel backend configured");
    Ok(())
}

/// Point the generated `.env` at the project database. Falls back to
/// `.env.example` when the installer did not leave a `.env` behind.
async fn configure_env(backend_path: &Path, config: &ProjectConfig) -> Result<()> {
    let env_path = backend_path.join(".env");
    let example_path = backend_path.join(".env.example");

    let mut contents = if fs::try_exists(&env_path).await? {
        fs::read_to_string(&env_path).await?
    } else if fs::try_exists(&example_path).await? {
        fs::read_to_string(&example_path).await?
    } else {
        String::new()
    };

    let db = &config.database;
    contents = set_env_var(&contents, "DB_CONNECTION", "mysql");
    contents = set_env_var(&contents, "DB_HOST", &db.host);
    contents = set_env_var(&contents, "DB_PORT", "3306");
    contents = set_env_var(&contents, "DB_DATABASE", &db.name);
    contents = set_env_var(&contents, "DB_USERNAME", &db.user);
    contents = set_env_var(&contents, "DB_PASSWORD", &db.password);

    if !contents.contains("SANCTUM_STATEFUL_DOMAINS") {
        contents.push_str("\nSANCTUM_STATEFUL_DOMAINS=localhost:4200\n");
    }

    fs::write(&env_path, contents)
        .await
        .with_context(|| format!("could not write {}", env_path.display()))?;
    Ok(())
}

/// Replace every `KEY=...` line, appending the assignment when the template
/// does not carry the key at all. `NoExpand` keeps `$` in passwords from
/// being treated as a capture-group reference.
fn set_env_var(contents: &str, key: &str, value: &str) -> String {
    let re = Regex::new(&format!(r"(?m)^{key}=.*$")).expect("valid env key pattern");
    let replacement = format!("{key}={value}");
    if re.is_match(contents) {
        re.replace_all(contents, NoExpand(&replacement)).into_owned()
    } else {
        let mut out = contents.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&replacement);
        out.push('\n');
        out
    }
}

async fn write_cors_config(backend_path: &Path) -> Result<()> {
    let path = backend_path.join("config").join("cors.php");
    fs::create_dir_all(path.parent().expect("cors.php has a parent")).await?;
    fs::write(&path, CORS_CONFIG)
        .await
        .with_context(|| format!("could not write {}", path.display()))?;
    Ok(())
}

async fn write_database_controller(backend_path: &Path) -> Result<()> {
    let dir = backend_path
        .join("app")
        .join("Http")
        .join("Controllers");
    fs::create_dir_all(&dir).await?;
    let path = dir.join("DatabaseController.php");
    fs::write(&path, DATABASE_CONTROLLER)
        .await
        .with_context(|| format!("could not write {}", path.display()))?;
    Ok(())
}

async fn write_api_routes(backend_path: &Path) -> Result<()> {
    let dir = backend_path.join("routes");
    fs::create_dir_all(&dir).await?;
    let path = dir.join("api.php");
    fs::write(&path, API_ROUTES)
        .await
        .with_context(|| format!("could not write {}", path.display()))?;
    Ok(())
}

const CORS_CONFIG: &str = r#"<?php

return [
    'paths' => ['api/*', 'sanctum/csrf-cookie'],
    'allowed_methods' => ['*'],
    'allowed_origins' => ['http://localhost:4200'],
    'allowed_origins_patterns' => [],
    'allowed_headers' => ['*'],
    'exposed_headers' => [],
    'max_age' => 0,
    'supports_credentials' => true,
];
"#;

const DATABASE_CONTROLLER: &str = r#"<?php

namespace App\Http\Controllers;

use Illuminate\Http\Request;
use Illuminate\Support\Facades\DB;

class DatabaseController extends Controller
{
    /**
     * Report the state of the database connection.
     */
    public function checkConnection()
    {
        try {
            DB::connection()->getPdo();

            $dbName = DB::connection()->getDatabaseName();

            return response()->json([
                'success' => true,
                'message' => 'Database connection established',
                'database' => $dbName,
                'connection' => 'active',
                'timestamp' => now()->toDateTimeString()
            ]);

        } catch (\Exception $e) {
            return response()->json([
                'success' => false,
                'message' => 'Could not connect to the database',
                'error' => $e->getMessage()
            ], 500);
        }
    }

    /**
     * Basic information about the generated project.
     */
    public function projectInfo()
    {
        return response()->json([
            'success' => true,
            'project' => [
                'name' => env('APP_NAME', 'Laravel'),
                'environment' => env('APP_ENV', 'production'),
                'debug' => env('APP_DEBUG', false),
                'url' => env('APP_URL', 'http://localhost'),
                'database' => env('DB_DATABASE', 'N/A'),
                'php_version' => PHP_VERSION,
                'laravel_version' => app()->version()
            ]
        ]);
    }
}
"#;

const API_ROUTES: &str = r#"<?php

use Illuminate\Http\Request;
use Illuminate\Support\Facades\Route;
use App\Http\Controllers\DatabaseController;

Route::get('/health', function () {
    return response()->json([
        'status' => 'ok',
        'message' => 'API is up',
        'timestamp' => now()->toDateTimeString()
    ]);
});

Route::get('/database/check', [DatabaseController::class, 'checkConnection']);
Route::get('/project/info', [DatabaseController::class, 'projectInfo']);

Route::middleware('auth:sanctum')->get('/user', function (Request $request) {
    return $request->user();
});
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_env_var_replaces_existing_assignments() {
        let env = "APP_NAME=Laravel\nDB_HOST=127.0.0.1\nDB_DATABASE=laravel\n";
        let out = set_env_var(env, "DB_HOST", "db.internal");
        assert!(out.contains("DB_HOST=db.internal"));
        assert!(!out.contains("DB_HOST=127.0.0.1"));
        assert!(out.contains("APP_NAME=Laravel"));
    }

    #[test]
    fn set_env_var_appends_missing_keys() {
        let out = set_env_var("APP_NAME=Laravel", "DB_PASSWORD", "hunter2");
        assert!(out.contains("APP_NAME=Laravel"));
        assert!(out.ends_with("DB_PASSWORD=hunter2\n"));
    }

    #[test]
    fn set_env_var_keeps_dollar_signs_literal() {
        let out = set_env_var("DB_PASSWORD=old\n", "DB_PASSWORD", "pa$$word$1");
        assert!(out.contains("DB_PASSWORD=pa$$word$1"));
    }
}
