//! floatip: manage reserved IPs across provider accounts
//!
//! Lists, locates, creates, deletes and reassigns reserved IPs for the
//! machines named in the configuration file, and replaces a machine's
//! reserved IP end to end.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use floatip_common::FleetConfig;
use floatip_common::defaults::DEFAULT_CONFIG_PATH;
use floatip_coordinator::ReservedIpService;
use floatip_coordinator::config::ProviderConfig;
use floatip_coordinator::provider::DigitalOceanClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "floatip")]
#[command(about = "Reserved IP management across provider accounts")]
#[command(version)]
struct Args {
    /// Configuration file with account tokens and machines
    #[arg(long, global = true, env = "FLOATIP_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Provider API base URL
    #[arg(long, global = true, env = "FLOATIP_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured machines
    Machines,

    /// List reserved IPs of every account (or one account)
    List {
        /// Only this account (`do_token2` or `2`)
        #[arg(long)]
        account: Option<String>,
        /// Bypass the listing cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Per-account overview with totals
    Accounts {
        #[arg(long)]
        no_cache: bool,
    },

    /// Find which account owns a reserved IP
    Locate { ip: String },

    /// Create a reserved IP for a machine
    Create { machine: String },

    /// Delete a reserved IP from whichever account owns it
    Delete { ip: String },

    /// Assign a reserved IP to a machine
    Assign { ip: String, machine: String },

    /// Release a reserved IP from its droplet
    Unassign { ip: String },

    /// Replace a machine's reserved IP with a new one
    Replace { machine: String },

    /// Droplet details of a machine, or find a droplet by IP or id
    Droplet {
        machine: Option<String>,
        /// Look up a droplet by public IP or id instead
        #[arg(long, requires = "account")]
        find: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },

    /// Reserved IP usage of an account
    Quota {
        #[arg(long, default_value = "1")]
        account: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;
    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    let suggestion = e
        .downcast_ref::<floatip_coordinator::replace::ReplaceError>()
        .and_then(|e| e.suggestion())
        .or_else(|| {
            e.downcast_ref::<floatip_coordinator::ServiceError>()
                .and_then(|e| e.suggestion())
        })
        .or_else(|| {
            e.downcast_ref::<floatip_coordinator::provider::ProviderError>()
                .and_then(|e| e.suggestion())
        });
    if let Some(suggestion) = suggestion {
        let _ = writeln!(stderr, "  \x1b[36mSuggestion:\x1b[0m {suggestion}");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let fleet = FleetConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    let mut provider = ProviderConfig::default();
    if let Some(url) = &args.api_url {
        provider = provider.with_base_url(url);
    }
    let service: ReservedIpService<DigitalOceanClient> =
        ReservedIpService::connect(fleet, &provider).context("Failed to create provider client")?;

    match args.command {
        Command::Machines => print_json(&service.machines()),

        Command::List { account, no_cache } => match account {
            Some(selector) => {
                let credential = service.credential(&selector)?;
                print_json(&service.list_reserved_ips(credential, !no_cache).await?)
            }
            None => print_json(&service.all_reserved_ips(!no_cache).await),
        },

        Command::Accounts { no_cache } => print_json(&service.accounts_overview(!no_cache).await),

        Command::Locate { ip } => print_json(&service.locate_reserved_ip(&ip).await?),

        Command::Create { machine } => print_json(&service.create_for_machine(&machine).await?),

        Command::Delete { ip } => print_json(&service.delete_by_ip(&ip).await?),

        Command::Assign { ip, machine } => {
            print_json(&service.assign_to_machine(&ip, &machine).await?)
        }

        Command::Unassign { ip } => print_json(&service.unassign_ip(&ip).await?),

        Command::Replace { machine } => {
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling replace");
                    ctrl_c.cancel();
                }
            });

            let report = service
                .replace_reserved_ip(&machine, cancel)
                .await
                .with_context(|| format!("Failed to replace reserved IP of machine '{machine}'"))?;
            info!(old_ip = %report.old_ip, new_ip = %report.new_ip, "Replace complete");
            print_json(&report)
        }

        Command::Droplet {
            machine,
            find,
            account,
        } => match (machine, find, account) {
            (_, Some(identifier), Some(selector)) => {
                let credential = service.credential(&selector)?;
                let found = service
                    .find_droplet(credential, &identifier)
                    .await?
                    .with_context(|| format!("No droplet matches '{identifier}'"))?;
                print_json(&found)
            }
            (Some(machine), _, _) => print_json(&service.machine_droplet_info(&machine).await?),
            _ => anyhow::bail!("Specify a machine name, or --find with --account"),
        },

        Command::Quota { account } => {
            let credential = service.credential(&account)?;
            print_json(&service.quota(credential).await?)
        }
    }
}
