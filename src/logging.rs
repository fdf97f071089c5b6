// Logging - tracing subscriber wiring
//
// One console layer (human-readable, or JSON in production) filtered by
// `RUST_LOG` or the configured level, plus one JSON layer per file appender
// with its own level.

use crate::config::{parse_level, LoggerConfig};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. Call once, at startup.
pub fn init(config: &LoggerConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(layers(config)?)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}

pub fn layers(config: &LoggerConfig) -> Result<Vec<BoxedLayer>> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console {
        let filter = EnvFilter::builder()
            .with_default_directive(parse_level(&config.level)?.into())
            .from_env_lossy();
        let console: BoxedLayer = if config.production {
            fmt::layer().json().with_filter(filter).boxed()
        } else {
            fmt::layer().with_filter(filter).boxed()
        };
        layers.push(console);
    }

    for appender in &config.file_appenders {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&appender.file)
            .with_context(|| format!("Failed to open log file {}", appender.file.display()))?;

        let layer = fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(parse_level(&appender.level)?)
            .boxed();
        layers.push(layer);
    }

    Ok(layers)
}
