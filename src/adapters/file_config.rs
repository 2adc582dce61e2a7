//! INI file configuration adapter.

use crate::domain::error::TapedeckError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfig {
    config: Ini,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TapedeckError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| TapedeckError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TapedeckError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TapedeckError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfig {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        self.config.getint(section, key).ok().flatten()
    }

    fn get_double(&self, section: &str, key: &str) -> Option<f64> {
        self.config.getfloat(section, key).ok().flatten()
    }

    fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[backtest]
cash = 25000.0
start_offset = 60
strategy = sma-cross

[sma]
fast = 5
slow = 20
"#;
        let config = FileConfig::from_string(content).unwrap();
        assert_eq!(
            config.get_string("backtest", "strategy"),
            Some("sma-cross".to_string())
        );
        assert_eq!(config.get_double("backtest", "cash"), Some(25000.0));
        assert_eq!(config.get_int("backtest", "start_offset"), Some(60));
        assert_eq!(config.get_int("sma", "slow"), Some(20));
    }

    #[test]
    fn missing_key_is_none() {
        let config = FileConfig::from_string("[backtest]\ncash = 100\n").unwrap();
        assert_eq!(config.get_string("backtest", "missing"), None);
        assert_eq!(config.get_int("missing_section", "key"), None);
        assert_eq!(config.get_double("backtest", "missing"), None);
    }

    #[test]
    fn unparseable_value_is_none() {
        let config = FileConfig::from_string("[backtest]\ncash = lots\n").unwrap();
        assert_eq!(config.get_double("backtest", "cash"), None);
        assert_eq!(config.get_int("backtest", "cash"), None);
    }

    #[test]
    fn bool_spellings() {
        let config =
            FileConfig::from_string("[live]\na = true\nb = Yes\nc = 1\nd = false\ne = no\nf = 0\n")
                .unwrap();
        assert_eq!(config.get_bool("live", "a"), Some(true));
        assert_eq!(config.get_bool("live", "b"), Some(true));
        assert_eq!(config.get_bool("live", "c"), Some(true));
        assert_eq!(config.get_bool("live", "d"), Some(false));
        assert_eq!(config.get_bool("live", "e"), Some(false));
        assert_eq!(config.get_bool("live", "f"), Some(false));
        assert_eq!(config.get_bool("live", "g"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[backtest]\nsymbol = BTC\n");
        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.get_string("backtest", "symbol"),
            Some("BTC".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfig::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(matches!(err, TapedeckError::ConfigParse { .. }));
    }
}
