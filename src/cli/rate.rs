use super::{describe_error, ui};
use crate::core::ConversionService;
use anyhow::{Result, bail};
use comfy_table::Cell;
use futures::future::join_all;
use tracing::debug;

/// Prints the rate from `from` to each of `targets`.
///
/// Without a date the latest rate is resolved as the conversion of one unit,
/// going through the cache. With a date every lookup goes to the provider.
pub async fn run(
    service: &ConversionService,
    from: &str,
    targets: &[String],
    date: Option<&str>,
) -> Result<()> {
    if targets.is_empty() {
        bail!("At least one target currency is required");
    }
    let date = date.map(str::trim);

    let lookups = targets.iter().map(|to| async move {
        let result = match date {
            Some(date) => service.get_historical_rate(from, to, date).await,
            None => service.convert_amount(from, to, 1.0, "").await,
        };
        (to.trim().to_uppercase(), result)
    });
    let results = join_all(lookups).await;

    // A single lookup reports its error directly
    if let [(_, Err(e))] = results.as_slice() {
        return Err(describe_error(e.clone()));
    }

    let date_label = date.unwrap_or("latest");
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("From"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
        ui::header_cell("Date"),
    ]);

    let from = from.trim().to_uppercase();
    let mut failures = 0;
    for (to, result) in results {
        let rate_cell = match result {
            Ok(rate) => ui::rate_cell(rate),
            Err(e) => {
                debug!("Rate lookup {}-{} failed: {}", from, to, e);
                failures += 1;
                ui::error_cell(&describe_error(e).to_string())
            }
        };
        table.add_row(vec![
            Cell::new(&from),
            Cell::new(to),
            rate_cell,
            Cell::new(date_label),
        ]);
    }

    println!(
        "{}\n\n{}",
        ui::style_text(&format!("Exchange rates for {from}"), ui::StyleType::Title),
        table
    );

    if failures == targets.len() {
        bail!("All {} rate lookups failed", failures);
    }
    Ok(())
}
