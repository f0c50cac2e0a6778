// Main entry point - Dependency injection and page rendering
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::application::hydrometric_service::HydrometricService;
use crate::application::wind_service::WindService;
use crate::domain::export::write_csv;
use crate::infrastructure::alerta_repository::AlertaRepository;
use crate::infrastructure::config::load_app_config;
use crate::presentation::cli::{Cli, OutputFormat};
use crate::presentation::render::chart_to_payload;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout carries the payload
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let app_config = load_app_config(&cli.config)?;
    let page = app_config.page(&cli.page)?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(AlertaRepository::new(
        app_config.api.base_url.clone(),
        app_config.api.token.clone(),
    ));

    // Create services (application layer)
    let hydrometric_service = HydrometricService::new(repository.clone());
    let wind_service = WindService::new(repository);

    let now = chrono::Utc::now();
    let requested = cli.requested_window(HydrometricService::observation_window(page, now, None))?;
    let mut chart = hydrometric_service.build_chart(page, now, requested).await?;
    cli.apply_view(&mut chart.viewport)?;

    let stdout = std::io::stdout();
    match cli.format {
        OutputFormat::Json => {
            let wind = wind_service.build_chart(page, now, requested).await?;
            let payload = chart_to_payload(&chart, wind.as_ref());
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &payload)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            write_csv(chart.viewport.visible_entries(), &chart.aux_columns, stdout.lock())?;
        }
    }

    tracing::info!(
        "Rendered page {} with {} entries",
        page.id,
        chart.viewport.entries().len()
    );
    Ok(())
}
