use super::{describe_error, ui};
use crate::core::ConversionService;
use anyhow::Result;
use tracing::info;

/// Formats the outcome of a conversion for display.
pub fn format_conversion(amount: f64, from: &str, to: &str, converted: f64, date: &str) -> String {
    let label = format!("{amount:.2} {} =", from.trim().to_uppercase());
    let value = format!("{converted:.2} {}", to.trim().to_uppercase());
    let mut line = format!(
        "{} {}",
        ui::style_text(&label, ui::StyleType::TotalLabel),
        ui::style_text(&value, ui::StyleType::TotalValue)
    );
    if !date.is_empty() {
        line.push_str(&ui::style_text(
            &format!(" (rate requested for {date})"),
            ui::StyleType::Subtle,
        ));
    }
    line
}

pub async fn run(
    service: &ConversionService,
    amount: f64,
    from: &str,
    to: &str,
    date: Option<&str>,
) -> Result<()> {
    let date = date.unwrap_or_default().trim();
    info!("Converting {} {} to {}", amount, from, to);

    let converted = service
        .convert_amount(from, to, amount, date)
        .await
        .map_err(describe_error)?;

    println!("{}", format_conversion(amount, from, to, converted, date));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_conversion() {
        console::set_colors_enabled(false);
        assert_eq!(
            format_conversion(100.0, "usd", " eur ", 86.0, ""),
            "100.00 USD = 86.00 EUR"
        );
        assert_eq!(
            format_conversion(1.0, "USD", "INR", 83.5, "2025-01-02"),
            "1.00 USD = 83.50 INR (rate requested for 2025-01-02)"
        );
    }
}
