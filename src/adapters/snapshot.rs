//! JSON snapshot persistence for series.

use crate::domain::error::TapedeckError;
use crate::domain::series::PriceSeries;
use std::fs;
use std::path::Path;

/// Write a series as pretty-printed JSON. The format is an implementation
/// detail; the contract is that [`load`] restores an equal series.
pub fn save(series: &PriceSeries, path: &Path) -> Result<(), TapedeckError> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, series).map_err(|e| TapedeckError::Data {
        reason: format!("failed to write snapshot {}: {}", path.display(), e),
    })
}

pub fn load(path: &Path) -> Result<PriceSeries, TapedeckError> {
    let content = fs::read_to_string(path).map_err(|e| TapedeckError::Data {
        reason: format!("could not load snapshot {}: {}", path.display(), e),
    })?;
    serde_json::from_str(&content).map_err(|e| TapedeckError::Data {
        reason: format!("could not load snapshot {}: {}", path.display(), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::PriceBar;
    use crate::domain::resolution::Resolution;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn save_then_load_round_trips() {
        let mut series = PriceSeries::new(Resolution::H1);
        for hour in 0..5 {
            let ts = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
            series.insert(ts, "ETH", PriceBar::new(1.0 + hour as f64, 2.0, 0.5, 1.5, 10.0));
        }
        series.insert(
            Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap(),
            "BTC",
            PriceBar::new(9.0, 9.5, 8.5, 9.2, 3.0),
        );

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("series.json");
        save(&series, &path).unwrap();
        let restored = load(&path).unwrap();

        assert_eq!(restored, series);
        assert_eq!(restored.resolution(), Resolution::H1);
    }

    #[test]
    fn missing_snapshot_is_a_data_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TapedeckError::Data { .. }));
    }

    #[test]
    fn garbage_snapshot_is_a_data_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(matches!(load(&path).unwrap_err(), TapedeckError::Data { .. }));
    }
}
