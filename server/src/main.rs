use std::net::Ipv4Addr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mailshot::campaign::CampaignService;
use mailshot::config::{CampaignConfig, ServerConfig};
use mailshot::jobs::MemoryJobStore;
use mailshot::mail::{MailerConfig, SmtpMailer};
use mailshot::{api, EnvConfig};

#[derive(Parser)]
#[command(name = "mailshot", about = "Bulk email campaign server")]
struct Cli {
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Overrides `PORT`.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set
    let level = match cli.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let campaign = CampaignConfig::from_env().context("invalid campaign configuration")?;
    let mailer_config = MailerConfig::from_env().context("invalid SMTP configuration")?;
    let server = ServerConfig::from_env().context("invalid server configuration")?;
    let port = cli.port.unwrap_or(server.port);

    tracing::info!(
        host = %mailer_config.host,
        port = mailer_config.port,
        tls = %mailer_config.tls,
        "SMTP relay"
    );
    tracing::info!(
        sender = %format!("{} <{}>", campaign.default_from_name, campaign.default_from_email),
        rate_limit = %campaign.rate_limit_label(),
        batch_size = campaign.default_batch_size,
        email_delay_ms = campaign.delay_between_emails,
        batch_delay_ms = campaign.delay_between_batches,
        max_retries = campaign.max_retries,
        "sending configuration"
    );
    if mailer_config.username.is_none() {
        tracing::warn!("SMTP_USERNAME is not set, sending without authentication");
    }

    let mailer = SmtpMailer::from_config(mailer_config).context("failed to build SMTP transport")?;
    let service = CampaignService::new(mailer, MemoryJobStore::new(), campaign);
    let router = api::router(service).layer(api::cors(server.cors_origins()));

    mailshot::serve((Ipv4Addr::UNSPECIFIED, port), router)
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}
