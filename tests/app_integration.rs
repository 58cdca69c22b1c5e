use std::fs;
use std::time::{Duration, Instant};
use tracing::info;
use xrate::core::config::AppConfig;
use xrate::core::{ConversionError, CurrencyCode, RateStore};

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn pair_path(from: &str, to: &str) -> String {
        format!(r"^/[^/]+/pair/{from}/{to}$")
    }

    pub fn success_body(rate: f64) -> String {
        format!(r#"{{"result": "success", "conversion_rate": {rate}}}"#)
    }

    pub async fn mount_rate(server: &MockServer, from: &str, to: &str, rate: f64) {
        Mock::given(method("GET"))
            .and(path_regex(pair_path(from, to)))
            .respond_with(ResponseTemplate::new(200).set_body_string(success_body(rate)))
            .mount(server)
            .await;
    }

    pub fn write_config(dir: &tempfile::TempDir, base_url: &str, currencies: &[&str]) -> String {
        let config_path = dir.path().join("config.yaml");
        let config_content = format!(
            r#"
currencies: [{}]
max_historical_days: 90
refresh_interval_secs: 3600
provider:
  base_url: {}
  api_key: "test-key"
  timeout_secs: 2
  retries: 1
  retry_delay_ms: 10
"#,
            currencies.join(", "),
            base_url
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path.to_str().unwrap().to_string()
    }
}

fn app_for(config_path: &str) -> xrate::App {
    let config = AppConfig::load_from_path(config_path).expect("Failed to load config");
    xrate::App::from_config(&config).expect("Failed to build app")
}

#[test_log::test(tokio::test)]
async fn test_full_convert_flow_with_mock() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_rate(&mock_server, "USD", "EUR", 0.86).await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR"]);

    let result = xrate::run_command(
        xrate::AppCommand::Convert {
            amount: 100.0,
            from: "usd".to_string(),
            to: " EUR ".to_string(),
            date: None,
        },
        Some(&config_path),
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_end_to_end_conversion_writes_through_cache() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path_regex(test_utils::pair_path("USD", "EUR")))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_string(test_utils::success_body(0.86)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR"]);
    let app = app_for(&config_path);

    let converted = app
        .service
        .convert_amount("usd", " EUR ", 100.0, "")
        .await
        .expect("Conversion failed");
    info!(?converted, "Converted 100 USD");
    assert!((converted - 86.0).abs() < 1e-9);

    let usd = CurrencyCode::new("USD");
    let eur = CurrencyCode::new("EUR");
    assert_eq!(app.cache.get_rate(&usd, &eur), Some(0.86));

    // Served from the cache, the mock expects a single request
    let converted = app.service.convert_amount("USD", "EUR", 10.0, "").await;
    assert!((converted.unwrap() - 8.6).abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn test_historical_rate_always_hits_provider() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path_regex(test_utils::pair_path("USD", "EUR")))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_string(test_utils::success_body(0.9)),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR"]);
    let app = app_for(&config_path);

    let date = (chrono::Utc::now().date_naive() - chrono::Days::new(7))
        .format("%Y-%m-%d")
        .to_string();
    for _ in 0..3 {
        let rate = app.service.get_historical_rate("USD", "EUR", &date).await;
        assert_eq!(rate, Ok(0.9));
    }
    assert_eq!(app.cache.stats().total_pairs, 0);
}

#[test_log::test(tokio::test)]
async fn test_provider_outage_is_reported_as_upstream_fault() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR"]);

    let result = xrate::run_command(
        xrate::AppCommand::Convert {
            amount: 1.0,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            date: None,
        },
        Some(&config_path),
    )
    .await;

    let err = result.expect_err("Conversion should fail when the provider is down");
    assert!(err.to_string().contains("temporarily unavailable"), "{err}");
}

#[test_log::test(tokio::test)]
async fn test_validation_errors_skip_provider() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR"]);
    let app = app_for(&config_path);

    assert_eq!(
        app.service.convert_amount("USD", "CAD", 1.0, "").await,
        Err(ConversionError::UnsupportedCurrency("CAD".to_string()))
    );
    assert_eq!(
        app.service.convert_amount("USD", "EUR", -1.0, "").await,
        Err(ConversionError::InvalidAmount(-1.0))
    );
    assert!(matches!(
        app.service.get_historical_rate("USD", "EUR", "not-a-date").await,
        Err(ConversionError::InvalidDateFormat(_))
    ));
    assert_eq!(app.service.convert_amount("EUR", "eur", 5.0, "").await, Ok(5.0));

    let result = xrate::run_command(
        xrate::AppCommand::Rate {
            from: "USD".to_string(),
            to: vec!["CAD".to_string()],
            date: None,
        },
        Some(&config_path),
    )
    .await;
    let err = result.expect_err("Unsupported currency should fail");
    assert!(err.to_string().starts_with("Invalid request"), "{err}");
}

#[test_log::test(tokio::test)]
async fn test_cli_tolerates_padded_dates() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_rate(&mock_server, "USD", "EUR", 0.86).await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR"]);

    let date = (chrono::Utc::now().date_naive() - chrono::Days::new(2))
        .format("%Y-%m-%d")
        .to_string();
    let result = xrate::run_command(
        xrate::AppCommand::Convert {
            amount: 5.0,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            date: Some(format!(" {date} ")),
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());

    let result = xrate::run_command(
        xrate::AppCommand::Rate {
            from: "USD".to_string(),
            to: vec!["EUR".to_string()],
            date: Some(format!("{date}\t")),
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Rate failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_status_command_makes_no_provider_call() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR"]);

    let result = xrate::run_command(xrate::AppCommand::Status, Some(&config_path)).await;
    assert!(result.is_ok(), "Status failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_refresh_command_with_one_failing_pair() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_rate(&mock_server, "USD", "EUR", 0.86).await;
    test_utils::mount_rate(&mock_server, "USD", "INR", 83.0).await;
    test_utils::mount_rate(&mock_server, "EUR", "USD", 1.16).await;
    test_utils::mount_rate(&mock_server, "INR", "USD", 0.012).await;
    test_utils::mount_rate(&mock_server, "INR", "EUR", 0.0104).await;
    // EUR-INR is not mounted and answers 404

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "EUR", "INR"]);

    let result = xrate::run_command(xrate::AppCommand::Refresh, Some(&config_path)).await;
    assert!(result.is_ok(), "Refresh failed with: {:?}", result.err());

    let app = app_for(&config_path);
    let eur = CurrencyCode::new("EUR");
    let inr = CurrencyCode::new("INR");
    app.cache.set_rate(&eur, &inr, 95.0);

    let summary = app.cache.refresh_all().await;
    assert_eq!(summary.total, 6);
    assert_eq!(summary.updated, 5);
    assert_eq!(app.cache.get_rate(&eur, &inr), Some(95.0));
    assert_eq!(app.cache.stats().total_pairs, 6);
}

#[test_log::test(tokio::test)]
async fn test_background_refresh_populates_cache() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_rate(&mock_server, "USD", "GBP", 0.79).await;
    test_utils::mount_rate(&mock_server, "GBP", "USD", 1.27).await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &mock_server.uri(), &["USD", "GBP"]);
    let app = app_for(&config_path);

    app.cache.start_background_refresh();
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.cache.stats().total_pairs < 2 {
        assert!(Instant::now() < deadline, "background refresh did not run");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    app.cache.stop().await;
    assert!(!app.cache.is_refreshing());

    let usd = CurrencyCode::new("USD");
    let gbp = CurrencyCode::new("GBP");
    assert_eq!(app.cache.get_rate(&usd, &gbp), Some(0.79));
    assert_eq!(app.cache.get_rate(&gbp, &usd), Some(1.27));

    // Conversion is now served from the cache
    let converted = app.service.convert_amount("GBP", "USD", 10.0, "").await;
    assert!((converted.unwrap() - 12.7).abs() < 1e-9);
}

#[test]
fn test_missing_api_key_fails_app_setup() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "currencies: [USD, EUR]\n").unwrap();

    let config = AppConfig::load_from_path(&config_path).unwrap();
    if config.provider.api_key.is_empty() {
        assert!(xrate::App::from_config(&config).is_err());
    }
}
