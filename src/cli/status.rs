use super::{cache_stats_line, ui};
use crate::core::ConversionService;
use crate::store::ExchangeRateCache;
use anyhow::Result;
use comfy_table::Cell;

/// Service status: version, configured currencies, refresh state and cache contents.
pub fn status_report(service: &ConversionService, cache: &ExchangeRateCache) -> String {
    let settings = service.settings();
    let codes: Vec<&str> = settings.currencies.codes().iter().map(|c| c.as_str()).collect();
    let refresh = if cache.is_refreshing() {
        "running"
    } else {
        "stopped"
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Check"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("status"), Cell::new("ok")]);
    table.add_row(vec![Cell::new("version"), Cell::new(env!("CARGO_PKG_VERSION"))]);
    table.add_row(vec![Cell::new("currencies"), Cell::new(codes.join(", "))]);
    table.add_row(vec![
        Cell::new("max historical days"),
        Cell::new(settings.max_historical_days),
    ]);
    table.add_row(vec![
        Cell::new("refresh interval"),
        Cell::new(format!("{}s", cache.refresh_interval().as_secs())),
    ]);
    table.add_row(vec![Cell::new("background refresh"), Cell::new(refresh)]);

    format!(
        "{}\n\n{}\n\n{}",
        ui::style_text("xrate status", ui::StyleType::Title),
        table,
        cache_stats_line(cache)
    )
}

pub fn run(service: &ConversionService, cache: &ExchangeRateCache) -> Result<()> {
    println!("{}", status_report(service, cache));
    Ok(())
}
