//! INI configuration adapter over `configparser`.
//!
//! Section and key names are case-insensitive. Values are trimmed before
//! typed parsing; a value that fails to parse is reported with its section
//! and key instead of falling back to the default.

use crate::domain::error::AlgoTraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use std::str::FromStr;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AlgoTraderError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| AlgoTraderError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, AlgoTraderError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| AlgoTraderError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { ini })
    }

    /// Trimmed raw value, `None` when the key is absent or empty.
    fn raw(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_or<T: FromStr>(
        &self,
        section: &str,
        key: &str,
        default: T,
        expected: &str,
        accept: impl Fn(&T) -> bool,
    ) -> Result<T, AlgoTraderError> {
        let Some(raw) = self.raw(section, key) else {
            return Ok(default);
        };
        raw.parse::<T>()
            .ok()
            .filter(|v| accept(v))
            .ok_or_else(|| AlgoTraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{raw}' is not {expected}"),
            })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.raw(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, AlgoTraderError> {
        self.parse_or(section, key, default, "an integer", |_| true)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, AlgoTraderError> {
        self.parse_or(section, key, default, "a finite number", |v: &f64| {
            v.is_finite()
        })
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, AlgoTraderError> {
        let Some(raw) = self.raw(section, key) else {
            return Ok(default);
        };
        parse_bool(&raw).ok_or_else(|| AlgoTraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' is not a boolean"),
        })
    }
}
