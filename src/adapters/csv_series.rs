//! CSV loader for single-symbol price files.

use crate::domain::bar::PriceBar;
use crate::domain::error::TapedeckError;
use crate::domain::resolution::Resolution;
use crate::domain::series::PriceSeries;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Load `timestamp,open,high,low,close,volume` rows (RFC 3339 timestamps,
/// header line required) into a single-symbol series at the declared
/// resolution. A file with only a header yields an empty series.
pub fn load_series(
    path: &Path,
    symbol: &str,
    resolution: Resolution,
) -> Result<PriceSeries, TapedeckError> {
    let content = fs::read_to_string(path).map_err(|e| TapedeckError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut series = PriceSeries::new(resolution);

    for result in rdr.records() {
        let record = result.map_err(|e| TapedeckError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let timestamp_str = record.get(0).ok_or_else(|| TapedeckError::Data {
            reason: "missing timestamp column".into(),
        })?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
            .map_err(|e| TapedeckError::Data {
                reason: format!("invalid timestamp '{}': {}", timestamp_str, e),
            })?
            .with_timezone(&Utc);

        let open = parse_field(&record, 1, "open")?;
        let high = parse_field(&record, 2, "high")?;
        let low = parse_field(&record, 3, "low")?;
        let close = parse_field(&record, 4, "close")?;
        let volume = parse_field(&record, 5, "volume")?;

        series.insert(timestamp, symbol, PriceBar::new(open, high, low, close, volume));
    }

    Ok(series)
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, TapedeckError> {
    record
        .get(index)
        .ok_or_else(|| TapedeckError::Data {
            reason: format!("missing {} column", name),
        })?
        .parse()
        .map_err(|e| TapedeckError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}
