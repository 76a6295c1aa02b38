use std::path::PathBuf;

use clap::Parser;
use os_inventory::config::Config;
use os_inventory::out::OutMode;
use os_inventory::secrets::{self, SecretStore};
use os_inventory::RunOptions;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "os-inventory", version, about = "Per-user OpenStack resource reports")]
struct Cli {
    /// YAML configuration file
    #[arg(short = 'c', long = "config", default_value = "config.yaml")]
    config: PathBuf,

    /// Prompt for a new mail password and store it in the keyring
    #[arg(long)]
    newpass_email: bool,

    /// Prompt for a new OpenStack password and store it in the keyring
    #[arg(long)]
    newpass_openstack: bool,

    /// Use built-in fixture resources instead of the cloud
    #[arg(long)]
    mock: bool,

    /// Deliver reports over SMTP or print them
    #[arg(long, value_enum, default_value_t = OutMode::Smtp)]
    out: OutMode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let store = SecretStore::default();
    if cli.newpass_openstack {
        store.rotate(secrets::OPENSTACK_SERVICE);
    }
    if cli.newpass_email {
        store.rotate(secrets::EMAIL_SERVICE);
    }

    let opts = RunOptions {
        mock: cli.mock,
        out: cli.out,
    };
    let summary = os_inventory::run(config, opts, &store).await?;
    println!(
        "{} resources, {} users, {} reports sent",
        summary.resources, summary.users, summary.notify.sent
    );
    Ok(())
}
