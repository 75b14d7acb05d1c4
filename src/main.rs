mod aggregate;
mod cli;
mod github;
mod model;
mod report;
mod stats;
mod window;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use github::GithubClient;
use model::TrackedUsers;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let window = cli.window()?;
    let tracked: TrackedUsers = cli.members.iter().cloned().collect();

    info!(
        start = %window.start(),
        end = %window.end(),
        orgs = cli.orgs.len(),
        members = tracked.len(),
        "collecting contributions"
    );

    // GitHub REST client
    let client = GithubClient::new(cli.token.as_str(), &cli.api_url)?;
    let repositories = client.fetch_orgs(&cli.orgs, &window).await?;
    info!(repos = repositories.len(), "fetched all repositories");

    let stats = aggregate::aggregate(&repositories, &tracked, &window);
    print!("{}", report::render(&stats, &window, cli.format)?);

    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("set_contributions=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
