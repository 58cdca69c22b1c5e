//! Command line front end over the conversion service and rate cache

pub mod convert;
pub mod rate;
pub mod refresh;
pub mod setup;
pub mod status;
pub mod ui;
pub mod watch;

use crate::core::ConversionError;
use crate::store::ExchangeRateCache;
use comfy_table::Cell;

/// Wraps a service error with a hint on who has to act on it.
pub(crate) fn describe_error(err: ConversionError) -> anyhow::Error {
    if err.is_client_error() {
        anyhow::anyhow!("Invalid request: {err}")
    } else {
        anyhow::anyhow!("Exchange rate service temporarily unavailable, try again later: {err}")
    }
}

/// Renders the cached rates with their last update time.
pub(crate) fn cached_rates_table(cache: &ExchangeRateCache) -> String {
    let entries = cache.entries();
    if entries.is_empty() {
        return ui::style_text("No cached rates", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("From"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
        ui::header_cell("Last Updated"),
    ]);
    for (key, entry) in entries {
        table.add_row(vec![
            Cell::new(key.from.as_str()),
            Cell::new(key.to.as_str()),
            ui::rate_cell(entry.rate),
            ui::timestamp_cell(entry.last_updated),
        ]);
    }
    table.to_string()
}

/// One-line summary of the cache contents.
pub(crate) fn cache_stats_line(cache: &ExchangeRateCache) -> String {
    let stats = cache.stats();
    let fmt = |ts: Option<chrono::DateTime<chrono::Utc>>| {
        ts.map_or("N/A".to_string(), ui::format_timestamp)
    };
    format!(
        "{} {} (oldest: {}, newest: {})",
        ui::style_text("Cached pairs:", ui::StyleType::TotalLabel),
        stats.total_pairs,
        fmt(stats.oldest_update),
        fmt(stats.newest_update)
    )
}
