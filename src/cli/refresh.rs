use super::{cache_stats_line, cached_rates_table, ui};
use crate::store::ExchangeRateCache;
use anyhow::{Result, bail};

/// Runs one refresh sweep over every supported pair and prints the result.
pub async fn run(cache: &ExchangeRateCache) -> Result<()> {
    let summary = cache.refresh_all().await;

    println!(
        "{}\n\n{}\n\n{}",
        ui::style_text("Cached exchange rates", ui::StyleType::Title),
        cached_rates_table(cache),
        cache_stats_line(cache)
    );

    let updated = format!("{}/{} pairs updated", summary.updated, summary.total);
    if summary.failed.is_empty() {
        println!("{}", ui::style_text(&updated, ui::StyleType::TotalValue));
        return Ok(());
    }

    let failed: Vec<String> = summary.failed.iter().map(ToString::to_string).collect();
    println!(
        "{}, failed: {}",
        updated,
        ui::style_text(&failed.join(", "), ui::StyleType::Error)
    );

    if summary.updated == 0 && summary.total > 0 {
        bail!("Refresh failed for every currency pair");
    }
    Ok(())
}
