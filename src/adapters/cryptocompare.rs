//! CryptoCompare history fetcher.

use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::resolution::Resolution;
use crate::domain::series::PriceSeries;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "Data", default)]
    data: Vec<HistoryRow>,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(rename = "volumefrom")]
    volume_from: f64,
}

/// Bulk history client for the min-api.cryptocompare.com endpoints. Only
/// daily, hourly and minute data exist upstream, so only those resolutions
/// are accepted. Network and venue failures surface as upstream errors;
/// nothing is retried.
pub struct CryptoCompare {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl CryptoCompare {
    pub fn new() -> Self {
        Self::with_base_url("https://min-api.cryptocompare.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    fn endpoint(resolution: Resolution) -> Result<&'static str, TapedeckError> {
        match resolution {
            Resolution::D1 => Ok("histoday"),
            Resolution::H1 => Ok("histohour"),
            Resolution::M1 => Ok("histominute"),
            other => Err(TapedeckError::Usage {
                reason: format!("cryptocompare serves 1d/1h/1m history, not {}", other),
            }),
        }
    }

    /// Fetch up to `limit` bars of `symbol` priced in `to_symbol`, ending at
    /// `to_ts` (unix seconds) or at the present.
    pub fn fetch(
        &self,
        symbol: &str,
        to_symbol: &str,
        resolution: Resolution,
        limit: u32,
        to_ts: Option<i64>,
    ) -> Result<PriceSeries, TapedeckError> {
        let url = format!("{}/data/{}", self.base_url, Self::endpoint(resolution)?);
        let mut query: Vec<(&str, String)> = vec![
            ("fsym", symbol.to_string()),
            ("tsym", to_symbol.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(to_ts) = to_ts {
            query.push(("toTs", to_ts.to_string()));
        }

        let body = self
            .client
            .get(&url)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .and_then(|response| response.text())
            .map_err(|e| TapedeckError::Upstream {
                reason: format!("cryptocompare request failed: {}", e),
            })?;

        parse_history(symbol, resolution, &body)
    }
}

impl Default for CryptoCompare {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn one history payload into a single-symbol series. Split out from the
/// HTTP path so it can be exercised on canned JSON.
pub fn parse_history(
    symbol: &str,
    resolution: Resolution,
    body: &str,
) -> Result<PriceSeries, TapedeckError> {
    let response: HistoryResponse =
        serde_json::from_str(body).map_err(|e| TapedeckError::Data {
            reason: format!("invalid history payload: {}", e),
        })?;

    if response.response.as_deref() == Some("Error") {
        return Err(TapedeckError::Upstream {
            reason: response
                .message
                .unwrap_or_else(|| "cryptocompare reported an error".to_string()),
        });
    }

    let mut series = PriceSeries::new(resolution);
    for row in response.data {
        let timestamp =
            DateTime::from_timestamp(row.time, 0).ok_or_else(|| TapedeckError::Data {
                reason: format!("bar timestamp {} out of range", row.time),
            })?;
        series.insert(
            timestamp,
            symbol,
            PriceBar::new(row.open, row.high, row.low, row.close, row.volume_from),
        );
    }

    if series.is_empty() {
        return Err(TapedeckError::Data {
            reason: format!("no data returned for {}", symbol),
        });
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const TWO_DAYS: &str = r#"{
        "Response": "Success",
        "Data": [
            {"time": 1704067200, "open": 100.0, "high": 110.0, "low": 95.0, "close": 105.0, "volumefrom": 1234.5, "volumeto": 130000.0},
            {"time": 1704153600, "open": 105.0, "high": 112.0, "low": 101.0, "close": 108.0, "volumefrom": 2345.6, "volumeto": 250000.0}
        ]
    }"#;

    #[test]
    fn parses_rows_into_a_series() {
        let series = parse_history("BTC", Resolution::D1, TWO_DAYS).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.resolution(), Resolution::D1);

        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bar = series.at(first, "BTC").unwrap();
        assert!((bar.open - 100.0).abs() < f64::EPSILON);
        assert!((bar.volume - 1234.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_data_is_a_data_error() {
        let err = parse_history("BTC", Resolution::D1, r#"{"Data": []}"#).unwrap_err();
        assert!(matches!(err, TapedeckError::Data { .. }));
    }

    #[test]
    fn venue_error_is_an_upstream_error() {
        let body = r#"{"Response": "Error", "Message": "fsym param is empty", "Data": []}"#;
        let err = parse_history("", Resolution::D1, body).unwrap_err();
        match err {
            TapedeckError::Upstream { reason } => assert!(reason.contains("fsym")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_a_data_error() {
        let err = parse_history("BTC", Resolution::D1, "{nope").unwrap_err();
        assert!(matches!(err, TapedeckError::Data { .. }));
    }

    #[test]
    fn unsupported_resolutions_are_usage_errors() {
        for resolution in [Resolution::S15, Resolution::M5, Resolution::W1] {
            assert!(matches!(
                CryptoCompare::endpoint(resolution).unwrap_err(),
                TapedeckError::Usage { .. }
            ));
        }
        assert_eq!(CryptoCompare::endpoint(Resolution::H1).unwrap(), "histohour");
    }
}
