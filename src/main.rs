//! Pipe Bindings CLI - resolve pipe endpoints offline

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use pipe_bindings::{
    resolve_pipe, validate_pipe, AllowList, BindingContext, BindingError, EngineConfig,
    FixSuggestion, InMemoryCluster, Pipe, Profile, DEFAULT_CATALOG,
};

const DEFAULT_NAMESPACE: &str = "default";

#[derive(Parser)]
#[command(name = "pipe-bindings")]
#[command(about = "Resolve integration pipe endpoints into route bindings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every endpoint of a pipe and print the bindings as YAML
    Resolve {
        /// Path to the pipe manifest
        file: PathBuf,

        /// YAML list of cluster objects the resolvers may read
        #[arg(short, long)]
        objects: Option<PathBuf>,

        /// Deployment profile (kubernetes, knative, openshift)
        #[arg(short, long, default_value = "kubernetes")]
        profile: Profile,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Check endpoint shape and cross-namespace access only
    Validate {
        /// Path to the pipe manifest
        file: PathBuf,

        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(Args)]
struct ContextArgs {
    /// Pipe namespace (defaults to the manifest's namespace)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Engine config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grant cross-namespace access, as identity:kind:namespace
    #[arg(long = "grant", value_name = "IDENTITY:KIND:NAMESPACE")]
    grants: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            file,
            objects,
            profile,
            context,
        } => resolve(&file, objects.as_deref(), profile, &context).await,
        Commands::Validate { file, context } => validate(&file, &context),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn resolve(
    file: &Path,
    objects: Option<&Path>,
    profile: Profile,
    args: &ContextArgs,
) -> Result<(), BindingError> {
    let pipe = Pipe::load(file)?;
    let cluster = match objects {
        Some(path) => load_objects(path)?,
        None => InMemoryCluster::new(),
    };
    let ctx = build_context(&pipe, cluster, args)?.with_profile(profile);

    let resolved = resolve_pipe(&DEFAULT_CATALOG, &ctx, &pipe.spec).await?;
    let yaml = serde_yaml::to_string(&resolved).map_err(|e| BindingError::Serialization {
        what: "resolved pipe".to_string(),
        reason: e.to_string(),
    })?;
    print!("{yaml}");
    Ok(())
}

fn validate(file: &Path, args: &ContextArgs) -> Result<(), BindingError> {
    let pipe = Pipe::load(file)?;
    let ctx = build_context(&pipe, InMemoryCluster::new(), args)?;
    let count = validate_pipe(&ctx, &pipe.spec)?;

    println!("{} Pipe '{}' is valid", "✓".green(), file.display());
    println!("  Namespace: {}", ctx.namespace);
    println!("  Endpoints: {}", count);
    Ok(())
}

fn build_context(
    pipe: &Pipe,
    cluster: InMemoryCluster,
    args: &ContextArgs,
) -> Result<BindingContext, BindingError> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    }
    .with_env();

    let namespace = args
        .namespace
        .as_deref()
        .or(pipe.metadata.namespace.as_deref())
        .unwrap_or(DEFAULT_NAMESPACE);

    let mut policy = AllowList::new();
    for grant in &args.grants {
        let mut parts = grant.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(identity), Some(kind), Some(ns)) if !identity.is_empty() => {
                policy = policy.grant(identity, kind, ns);
            }
            _ => {
                return Err(BindingError::Config {
                    reason: format!("invalid grant '{grant}', expected identity:kind:namespace"),
                })
            }
        }
    }

    let mut ctx = BindingContext::new(namespace, Arc::new(cluster))
        .with_config(Arc::new(config))
        .with_policy(Arc::new(policy))
        .with_service_account(pipe.spec.service_account_name.as_deref().unwrap_or_default());
    for (key, value) in pipe.metadata_entries() {
        ctx = ctx.with_metadata(&key, &value);
    }
    Ok(ctx)
}

fn load_objects(path: &Path) -> Result<InMemoryCluster, BindingError> {
    let content = fs::read_to_string(path).map_err(|e| BindingError::Config {
        reason: format!("Failed to read objects file {}: {}", path.display(), e),
    })?;
    let cluster = InMemoryCluster::from_yaml(&content).map_err(|e| BindingError::Config {
        reason: format!("Failed to parse objects file {}: {}", path.display(), e),
    })?;
    tracing::debug!(count = cluster.objects().len(), file = %path.display(), "loaded cluster objects");
    Ok(cluster)
}
