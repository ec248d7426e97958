//! Build a catalog from the reference tables on disk.
//!
//! Usage: `build-catalog [REFERENCE_DIR] [--refresh]`
//!
//! With `--refresh`, cards, sets and rarities are searched upstream before
//! the run. The catalog is written to stdout as JSON.

use anyhow::Context;
use cardex_collector::CatalogPipeline;
use cardex_core::AppConfig;
use cardex_reference::ReferenceLoader;
use std::sync::Arc;
use tracing::info;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cardex=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let refresh = args.iter().any(|arg| arg == "--refresh");
    let reference_dir = args.iter().find(|arg| !arg.starts_with("--"));

    let config = AppConfig::load_with_env().context("loading configuration")?;
    let loader = match reference_dir {
        Some(dir) => ReferenceLoader::new(dir)?,
        None => ReferenceLoader::with_default_dir()?,
    };
    info!(dir = %loader.reference_dir().display(), "Loading reference tables");
    let mut tables = loader.load().context("loading reference tables")?;

    let pipeline = CatalogPipeline::from_config(&config)?;
    let mut refresh_stats = None;
    if refresh {
        let refreshed = pipeline.refresh_reference(&tables).await;
        tables = refreshed.tables;
        refresh_stats = Some(refreshed.stats);
    }
    let tables = Arc::new(tables);

    let mut output = pipeline.run(tables.sets(), &tables).await;
    if let Some(stats) = &refresh_stats {
        output.stats.merge(stats);
    }
    info!(
        printings = output.stats.printings,
        unlinked = output.unlinked_images.len(),
        failed = output.stats.failed_workers,
        "Catalog built"
    );

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
