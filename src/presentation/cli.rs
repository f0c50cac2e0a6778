// Command line arguments
use crate::application::forecast_repository::TimeWindow;
use crate::domain::series::parse_instant;
use crate::domain::viewport::Viewport;
use crate::infrastructure::config::DEFAULT_CONFIG_PATH;
use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Chart payload with viewport bounds
    Json,
    /// Spreadsheet export of the aligned series
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "hydro-dashboard", about = "Aligned hydrometric series and chart bounds for a dashboard page")]
pub struct Cli {
    /// Page id from the configuration
    pub page: String,

    /// Configuration file, without extension
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Start of the observation window (RFC 3339), instead of the page's days
    #[arg(long)]
    pub since: Option<String>,

    /// End of the observation window (RFC 3339), instead of the page's days
    #[arg(long)]
    pub until: Option<String>,

    /// Zoom the chart to a time range (RFC 3339 instants)
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub zoom: Option<Vec<String>>,

    /// Return to the full view after zooming
    #[arg(long)]
    pub reset: bool,
}

impl Cli {
    /// Window requested with `--since`/`--until`. A side left out keeps the
    /// page default.
    pub fn requested_window(&self, default: TimeWindow) -> anyhow::Result<Option<TimeWindow>> {
        if self.since.is_none() && self.until.is_none() {
            return Ok(None);
        }

        let start = self
            .since
            .as_deref()
            .map(parse_instant)
            .transpose()
            .context("Invalid --since")?
            .unwrap_or(default.start);
        let end = self
            .until
            .as_deref()
            .map(parse_instant)
            .transpose()
            .context("Invalid --until")?
            .unwrap_or(default.end);

        if start >= end {
            bail!("--since {} is not before --until {}", start, end);
        }
        Ok(Some(TimeWindow::new(start, end)))
    }

    /// Replay `--zoom` as a press-drag-release gesture, then `--reset`.
    pub fn apply_view(&self, viewport: &mut Viewport) -> anyhow::Result<()> {
        if let Some(zoom) = &self.zoom {
            let [start, end] = zoom.as_slice() else {
                bail!("--zoom takes a start and an end instant");
            };
            let start = parse_instant(start).context("Invalid zoom start")?;
            let end = parse_instant(end).context("Invalid zoom end")?;

            viewport.begin_or_extend_selection(start);
            viewport.begin_or_extend_selection(end);
            tracing::debug!("Selection {:?}", viewport.pending_selection());
            viewport.commit_selection();
        }

        if self.reset {
            viewport.reset_zoom();
        }

        tracing::debug!(
            "Viewport time {:?}, values {:?}",
            viewport.visible_range(),
            viewport.value_range()
        );
        Ok(())
    }
}
