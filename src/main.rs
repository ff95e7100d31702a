use anyhow::Context;
use portfolio_backend::configuration::get_configuration;
use portfolio_backend::startup::Application;
use portfolio_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // telemetry setup
    let subscriber = get_subscriber("portfolio_backend".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
