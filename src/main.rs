use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stackgen::config::{self, DatabaseConfig, ProjectConfig, ProjectManifest};
use stackgen::devserver::{self, DevServerConfig, ServiceSpec};
use stackgen::{db, scaffold, toolchain, ui};

#[derive(Parser)]
#[command(name = "stackgen")]
#[command(about = "Generate Laravel + Angular full-stack projects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new full-stack project
    New {
        /// Project name; prompted for when omitted
        name: Option<String>,

        /// Database name (defaults to the project name with a _db suffix)
        #[arg(long)]
        database: Option<String>,

        /// Database user
        #[arg(long)]
        db_user: Option<String>,

        /// Database password
        #[arg(long)]
        db_password: Option<String>,

        /// Database host
        #[arg(long)]
        db_host: Option<String>,

        /// Accept the default answer for every remaining question
        #[arg(short = 'y', long)]
        yes: bool,

        /// Exit after scaffolding instead of offering to start the servers
        #[arg(long)]
        no_serve: bool,

        /// Seconds to wait for each dev server's readiness marker
        #[arg(long, default_value_t = 180)]
        ready_timeout: u64,
    },
    /// Start the dev servers for an existing generated project
    Serve {
        /// Project root containing stackgen.json
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Override the backend readiness marker
        #[arg(long)]
        backend_marker: Option<String>,

        /// Override the frontend readiness marker
        #[arg(long)]
        frontend_marker: Option<String>,

        /// Seconds to wait for each dev server's readiness marker
        #[arg(long, default_value_t = 180)]
        ready_timeout: u64,
    },
    /// Check that the required toolchain is installed
    Check,
}

/// Logs go to stderr so the interactive conversation owns stdout.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "stackgen=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check) => run_check().await,
        Some(Commands::Serve {
            dir,
            backend_marker,
            frontend_marker,
            ready_timeout,
        }) => {
            run_serve(
                dir,
                backend_marker,
                frontend_marker,
                Duration::from_secs(ready_timeout),
            )
            .await
        }
        Some(Commands::New {
            name,
            database,
            db_user,
            db_password,
            db_host,
            yes,
            no_serve,
            ready_timeout,
        }) => {
            let options = NewOptions {
                name,
                database,
                db_user,
                db_password,
                db_host,
                yes,
                no_serve,
                ready_timeout: Duration::from_secs(ready_timeout),
            };
            run_new(options).await
        }
        None => run_new(NewOptions::default()).await,
    }
}

async fn run_check() -> Result<()> {
    ui::header("Toolchain check");
    let report = toolchain::check_all().await;
    for tool in &report.tools {
        if tool.ok {
            let version = tool.version.as_deref().unwrap_or("installed");
            ui::success(&format!("{} {}", tool.name, version));
        } else {
            ui::error(&format!("{} not found ({})", tool.name, tool.install_hint));
        }
    }
    if !report.all_ok() {
        bail!("missing required tools");
    }
    Ok(())
}

/// Answers taken from flags; anything left `None` is prompted for (or, with
/// `--yes`, defaulted).
struct NewOptions {
    name: Option<String>,
    database: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_host: Option<String>,
    yes: bool,
    no_serve: bool,
    ready_timeout: Duration,
}

impl Default for NewOptions {
    fn default() -> Self {
        Self {
            name: None,
            database: None,
            db_user: None,
            db_password: None,
            db_host: None,
            yes: false,
            no_serve: false,
            ready_timeout: devserver::DEFAULT_READY_TIMEOUT,
        }
    }
}

async fn run_new(options: NewOptions) -> Result<()> {
    ui::header("stackgen: Laravel + Angular project generator");

    // Step 1: toolchain.
    let pb = ui::spinner("Checking toolchain...");
    let report = toolchain::check_all().await;
    pb.finish_and_clear();
    if !report.all_ok() {
        ui::error("Missing required tools:");
        for tool in report.missing() {
            ui::error(&format!("  {}: {}", tool.name, tool.install_hint));
        }
        bail!("install the missing tools and try again");
    }
    ui::success("All required tools are installed");

    // Step 2: project configuration.
    ui::header("Project configuration");
    let prompter = ui::Prompter::new();
    let project_name = match options.name {
        Some(name) => {
            config::validate_project_name(&name)?;
            name
        }
        None if options.yes => "my-project".to_string(),
        None => prompter.validated_input("Project name?", "my-project", |value| {
            config::validate_project_name(value).map_err(|e| e.to_string())
        })?,
    };
    let database_name = match options.database {
        Some(name) => {
            config::validate_database_name(&name)?;
            name
        }
        None if options.yes => config::default_database_name(&project_name),
        None => prompter.validated_input(
            "Database name?",
            &config::default_database_name(&project_name),
            |value| config::validate_database_name(value).map_err(|e| e.to_string()),
        )?,
    };
    let database_user = match options.db_user {
        Some(user) => user,
        None if options.yes => "root".to_string(),
        None => prompter.input("Database user?", "root")?,
    };
    let database_password = match options.db_password {
        Some(password) => password,
        None if options.yes => String::new(),
        None => prompter.secret("Database password?")?,
    };
    let database_host = match options.db_host {
        Some(host) => host,
        None if options.yes => "localhost".to_string(),
        None => prompter.input("Database host?", "localhost")?,
    };
    let create_database = if options.yes {
        true
    } else {
        prompter.confirm("Create the database if it does not exist?", true)?
    };

    let project = ProjectConfig {
        project_name,
        database: DatabaseConfig {
            host: database_host,
            user: database_user,
            password: database_password,
            name: database_name,
        },
    };

    // Step 3: database connectivity.
    let pb = ui::spinner("Connecting to MySQL...");
    let ping = db::ping(&project.database).await;
    pb.finish_and_clear();
    match ping {
        Ok(()) => ui::success("Database connection OK"),
        Err(err) => {
            ui::error(&err.to_string());
            bail!("could not connect to the database");
        }
    }

    if create_database {
        let pb = ui::spinner(&format!("Creating database {}...", project.database.name));
        let outcome = db::ensure_database(&project.database).await;
        pb.finish_and_clear();
        match outcome {
            Ok(db::EnsureOutcome::Created) => {
                ui::success(&format!("Database {} created", project.database.name));
            }
            Ok(db::EnsureOutcome::AlreadyExisted) => {
                ui::warn(&format!("Database {} already exists", project.database.name));
            }
            Err(err) => ui::warn(&format!("Could not create the database: {err}")),
        }
    }

    // Step 4: scaffold both trees.
    ui::header("Creating project structure");
    let cwd = std::env::current_dir().context("could not determine the working directory")?;
    let project_root = project.project_root(&cwd);
    let backend_path = project_root.join(project.backend_dir_name());
    let frontend_path = project_root.join(project.frontend_dir_name());
    tokio::fs::create_dir_all(&project_root)
        .await
        .with_context(|| format!("could not create {}", project_root.display()))?;

    scaffold::setup_backend(&backend_path, &project).await?;
    scaffold::setup_frontend(&frontend_path, &project).await?;

    let manifest = ProjectManifest::for_project(&project);
    manifest.store(&project_root)?;

    // Step 5: summary, then optionally hand over to the dev servers.
    ui::header("Project created");
    println!("  {}/", project_root.display());
    println!("  ├── {}/ (Laravel)", manifest.backend_dir);
    println!("  └── {}/ (Angular)", manifest.frontend_dir);

    if options.no_serve {
        ui::manual_serve_hint(&manifest.backend_dir, &manifest.frontend_dir);
        return Ok(());
    }

    let start_now = if options.yes {
        true
    } else {
        prompter.confirm("Start the development servers now?", true)?
    };
    if start_now {
        devserver::run(dev_config(&manifest, &project_root, options.ready_timeout)).await?;
    } else {
        ui::manual_serve_hint(&manifest.backend_dir, &manifest.frontend_dir);
    }
    Ok(())
}

async fn run_serve(
    dir: PathBuf,
    backend_marker: Option<String>,
    frontend_marker: Option<String>,
    ready_timeout: Duration,
) -> Result<()> {
    let project_root = dir
        .canonicalize()
        .with_context(|| format!("project directory {} not found", dir.display()))?;
    let mut manifest = ProjectManifest::load(&project_root)?;

    if let Some(marker) = backend_marker {
        manifest.backend_ready_marker = marker;
    }
    if let Some(marker) = frontend_marker {
        manifest.frontend_ready_marker = marker;
    }

    devserver::run(dev_config(&manifest, &project_root, ready_timeout)).await?;
    Ok(())
}

fn dev_config(
    manifest: &ProjectManifest,
    project_root: &Path,
    ready_timeout: Duration,
) -> DevServerConfig {
    DevServerConfig {
        backend: ServiceSpec::laravel(manifest.backend_path(project_root))
            .with_ready_marker(manifest.backend_ready_marker.clone()),
        frontend: ServiceSpec::angular(manifest.frontend_path(project_root))
            .with_ready_marker(manifest.frontend_ready_marker.clone()),
        database_label: manifest.database.clone(),
        ready_timeout,
    }
}
