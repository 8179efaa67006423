//! tenant-guard - offline access-control checks
//!
//! Loads a policy seed, resolves user contexts and evaluates access requests
//! exactly as an embedding service would.

#![allow(missing_docs)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tenant_guard::config::Config;
use tenant_guard::utils::logging::init_tracing;
use tenant_guard::{
    AccessCore, AccessRequest, MemoryRoleStore, PolicySeed, Principal, ResourceTarget, Scope,
};

#[derive(Parser, Debug)]
#[command(name = "tenant-guard", version = tenant_guard::VERSION, about = "Tenant-scoped permission checks")]
struct Cli {
    /// Configuration file (YAML); environment variables are used when absent
    #[arg(short, long, env = "TENANT_GUARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, overrides the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one access request against a policy seed
    Check(CheckArgs),
    /// Print the resolved context of a user within a tenant
    Roles(PrincipalArgs),
    /// Validate the configuration and print it back
    Validate,
    /// Print version and build metadata
    Version,
}

#[derive(Args, Debug)]
struct PrincipalArgs {
    /// Policy seed file (YAML)
    #[arg(short, long)]
    policy: PathBuf,

    #[arg(short, long)]
    user: String,

    #[arg(short, long)]
    tenant: String,

    #[arg(long)]
    account: Option<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    principal: PrincipalArgs,

    #[arg(long)]
    action: String,

    #[arg(long)]
    resource: String,

    /// own, account, tenant or global
    #[arg(long, default_value = "tenant")]
    scope: Scope,

    #[arg(long)]
    resource_id: Option<String>,

    /// Tenant owning the resource
    #[arg(long)]
    target_tenant: Option<String>,

    /// Account owning the resource
    #[arg(long)]
    target_account: Option<String>,

    /// User owning the resource
    #[arg(long)]
    owner: Option<String>,

    /// Allow a read permission to satisfy a read-type action
    #[arg(long)]
    read_fallback: bool,
}

impl PrincipalArgs {
    fn principal(&self) -> Principal {
        let principal = Principal::new(&self.user, &self.tenant);
        match &self.account {
            Some(account) => principal.with_account(account),
            None => principal,
        }
    }
}

impl CheckArgs {
    fn request(&self) -> AccessRequest {
        let mut request = AccessRequest::new(&self.action, &self.resource, self.scope);
        if let Some(id) = &self.resource_id {
            request = request.with_resource_id(id);
        }
        if let Some(tenant) = &self.target_tenant {
            let mut target = ResourceTarget::tenant(tenant);
            if let Some(account) = &self.target_account {
                target = target.with_account(account);
            }
            if let Some(owner) = &self.owner {
                target = target.with_owner(owner);
            }
            request = request.with_target(target);
        } else {
            request.target.account_id = self.target_account.clone();
            request.target.owner_id = self.owner.clone();
        }
        if self.read_fallback {
            request = request.with_read_only_fallback();
        }
        request
    }
}

async fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    Ok(config)
}

async fn open_core(config: Config, policy: &PathBuf) -> anyhow::Result<AccessCore> {
    let seed = PolicySeed::from_file(policy)
        .await
        .with_context(|| format!("reading policy {}", policy.display()))?;
    let store = MemoryRoleStore::from_seed(&seed, &config.rbac.super_admin_role)?;
    let core = AccessCore::builder(config)
        .with_role_store(Arc::new(store))
        .build()
        .await?;
    Ok(core)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Command::Version = cli.command {
        println!("{}", tenant_guard::build_info());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli).await?;
    init_tracing(&config.logging)?;

    match &cli.command {
        Command::Version => Ok(ExitCode::SUCCESS),
        Command::Validate => {
            config.validate()?;
            print!("{}", config.to_yaml()?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Roles(args) => {
            let core = open_core(config, &args.policy).await?;
            let context = core.resolve_context(&args.principal()).await?;
            println!("{}", serde_json::to_string_pretty(&context)?);
            core.shutdown().await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => {
            let core = open_core(config, &args.principal.policy).await?;
            let decision = core.check(&args.principal.principal(), &args.request()).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);
            core.shutdown().await;
            // exit 2 on denial, 1 on error
            Ok(if decision.allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
