use super::{cache_stats_line, cached_rates_table, ui};
use crate::store::ExchangeRateCache;
use anyhow::{Context, Result};
use tracing::info;

/// Keeps the cache refreshed in the background until Ctrl-C is received.
pub async fn run(cache: &ExchangeRateCache) -> Result<()> {
    cache.start_background_refresh();
    println!(
        "Refreshing rates every {:?}. {}",
        cache.refresh_interval(),
        ui::style_text("Press Ctrl-C to stop.", ui::StyleType::Subtle)
    );

    let signal = tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal");

    info!("Shutting down background refresh");
    cache.stop().await;
    signal?;

    println!(
        "{}\n\n{}\n\n{}",
        ui::style_text("Cached exchange rates", ui::StyleType::Title),
        cached_rates_table(cache),
        cache_stats_line(cache)
    );
    Ok(())
}
