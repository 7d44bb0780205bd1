//! batch-publish CLI
//!
//! Publishes every package directory of a workspace to an npm registry

use anyhow::{Context, Result};
use batch_publish::{
    AuthConfig, BatchPublisher, CONFIG_FILENAME, Candidate, ConfigLoadOptions, ConfigLoader, NpmPlugin,
    PublishConfig, PublishOptions, collect_candidates, discover_candidates,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// Publish every package directory of a workspace
#[derive(Parser)]
#[command(name = "batch-publish")]
#[command(version)]
#[command(about = "Publish every package directory of a workspace to an npm registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish every eligible package
    Publish {
        #[command(flatten)]
        selection: Selection,

        /// Registry URL
        #[arg(long)]
        registry: Option<String>,

        /// Registry username
        #[arg(long)]
        username: Option<String>,

        /// Registry password
        #[arg(long, env = "BATCH_PUBLISH_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Registry email
        #[arg(long)]
        email: Option<String>,

        /// Per-publish timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Run an install before publishing (accepted, no effect)
        #[arg(long)]
        install_before: bool,

        /// Force the install (accepted, no effect)
        #[arg(long)]
        force_install: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the packages that would be published
    List {
        #[command(flatten)]
        selection: Selection,
    },

    /// Write a default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Options shared by the commands that select packages
#[derive(Args)]
struct Selection {
    /// Package directories or glob patterns (replaces configured sources)
    #[arg(value_name = "SOURCES")]
    sources: Vec<String>,

    /// Configuration file (defaults to ./.publish-config.yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path substring to skip (repeatable, replaces the configured list)
    #[arg(long, value_name = "SUBSTR")]
    ignore: Vec<String>,

    /// Root to search recursively for packages (repeatable)
    #[arg(long, value_name = "ROOT")]
    discover: Vec<String>,

    /// Maximum depth when searching discovery roots
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
}

impl Selection {
    fn to_config(&self) -> PublishConfig {
        let non_empty = |items: &Vec<String>| (!items.is_empty()).then(|| items.clone());

        PublishConfig {
            sources: non_empty(&self.sources),
            ignore: non_empty(&self.ignore),
            discover: non_empty(&self.discover),
            max_depth: self.max_depth,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let project_path = std::env::current_dir().context("Unable to determine current directory")?;

    match cli.command {
        Commands::Publish {
            selection,
            registry,
            username,
            password,
            email,
            timeout,
            install_before,
            force_install,
            json,
        } => {
            let auth = (username.is_some() || password.is_some() || email.is_some()).then_some(
                AuthConfig {
                    username,
                    password,
                    email,
                },
            );
            let overrides = PublishConfig {
                registry,
                auth,
                timeout_secs: timeout,
                install_before: install_before.then_some(true),
                force_install: force_install.then_some(true),
                ..selection.to_config()
            };

            publish_command(&project_path, selection.config, overrides, json).await
        }
        Commands::List { selection } => {
            let overrides = selection.to_config();
            list_command(&project_path, selection.config, overrides).await
        }
        Commands::Init { force } => init_command(&project_path, force).await,
    }
}

/// Load, validate and resolve the layered configuration
async fn load_config(
    project_path: &Path,
    config_file: Option<PathBuf>,
    overrides: PublishConfig,
) -> Result<Option<(PublishConfig, PublishOptions)>> {
    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path: project_path.to_path_buf(),
        config_file,
        include_global: true,
        cli_args: Some(overrides),
        env: std::env::vars().collect(),
    })
    .await?;

    let validation = ConfigLoader::validate(&config);
    if !validation.valid || !validation.warnings.is_empty() {
        eprintln!("{}", ConfigLoader::format_validation_result(&validation));
    }
    if !validation.valid {
        return Ok(None);
    }

    let options = config.resolve();
    Ok(Some((config, options)))
}

/// Expand configured sources and discovery roots into candidates
fn candidates(
    project_path: &Path,
    config: &PublishConfig,
    options: &PublishOptions,
) -> Result<Vec<Candidate>> {
    let sources = config.sources.clone().unwrap_or_default();
    let roots = config.discover.clone().unwrap_or_default();

    if sources.is_empty() && roots.is_empty() {
        anyhow::bail!(
            "No sources configured. Pass package directories, use --discover, or run `batch-publish init`"
        );
    }

    let mut candidates = collect_candidates(&sources, project_path)?;
    for root in &roots {
        candidates.extend(discover_candidates(
            root,
            project_path,
            &options.ignore,
            config.max_depth,
        ));
    }

    Ok(candidates)
}

async fn publish_command(
    project_path: &Path,
    config_file: Option<PathBuf>,
    overrides: PublishConfig,
    json: bool,
) -> Result<i32> {
    let Some((config, options)) = load_config(project_path, config_file, overrides).await? else {
        return Ok(1);
    };
    let candidates = candidates(project_path, &config, &options)?;

    if !json {
        println!("\n📦 batch-publish\n");
    }

    let publisher = BatchPublisher::new(Arc::new(NpmPlugin::new()), options);
    match publisher.publish_all(&candidates).await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print_summary();
            }
            Ok(report.exit_code())
        }
        Err(e) => {
            eprintln!("\n❌ Batch publishing aborted [{}]: {}", e.code(), e);
            for action in e.suggested_actions() {
                eprintln!("  - {}", action);
            }
            Ok(1)
        }
    }
}

async fn list_command(
    project_path: &Path,
    config_file: Option<PathBuf>,
    overrides: PublishConfig,
) -> Result<i32> {
    let Some((config, options)) = load_config(project_path, config_file, overrides).await? else {
        return Ok(1);
    };
    let candidates = candidates(project_path, &config, &options)?;

    let publisher = BatchPublisher::new(Arc::new(NpmPlugin::new()), options);
    let targets = publisher.select_targets(&candidates);

    if targets.is_empty() {
        println!("⚠️  No publishable packages found");
        return Ok(0);
    }

    for target in &targets {
        println!("{}\t{}", target.name(), target.path().display());
    }
    println!("\n{} package(s)", targets.len());

    Ok(0)
}

async fn init_command(project_path: &Path, force: bool) -> Result<i32> {
    println!("\n🎯 Initialize batch-publish\n");

    let path = project_path.join(CONFIG_FILENAME);
    if path.exists() && !force {
        eprintln!("⚠️  {} already exists (use --force to overwrite)", path.display());
        return Ok(1);
    }

    let yaml = serde_yaml::to_string(&PublishConfig::template())?;
    tokio::fs::write(&path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Created {}", path.display());
    Ok(0)
}
