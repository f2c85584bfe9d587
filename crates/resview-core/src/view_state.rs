//! Save/restore of view settings as key-value pairs.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    KEY_ACTIVE_TAB, KEY_FORMAT_NUMBERS, KEY_NUMERIC_PRECISION, KEY_SHOW_FIELDS_AS_SCALARS,
};
use crate::error::{ResViewError, Result};

/// Read side of a key-value persistence store.
pub trait StateSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Write side of a key-value persistence store.
pub trait StateSink {
    fn put_integer(&mut self, key: &str, value: i64);
    fn put_boolean(&mut self, key: &str, value: bool);
}

impl StateSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl StateSink for HashMap<String, String> {
    fn put_integer(&mut self, key: &str, value: i64) {
        self.insert(key.to_string(), value.to_string());
    }

    fn put_boolean(&mut self, key: &str, value: bool) {
        self.insert(key.to_string(), value.to_string());
    }
}

impl StateSource for toml::Table {
    fn get(&self, key: &str) -> Option<String> {
        match toml::Table::get(self, key)? {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }
}

impl StateSink for toml::Table {
    fn put_integer(&mut self, key: &str, value: i64) {
        self.insert(key.to_string(), toml::Value::Integer(value));
    }

    fn put_boolean(&mut self, key: &str, value: bool) {
        self.insert(key.to_string(), toml::Value::Boolean(value));
    }
}

/// Persisted view settings. Every key is optional; a missing key leaves
/// the corresponding setting untouched on restore.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_tab: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_numbers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_fields_as_scalars: Option<bool>,
}

impl ViewState {
    /// Read the four keys from `source`. Malformed values are logged and
    /// treated as missing.
    pub fn read_from(source: &dyn StateSource) -> Self {
        Self {
            active_tab: read_key(source, KEY_ACTIVE_TAB),
            format_numbers: read_key(source, KEY_FORMAT_NUMBERS),
            numeric_precision: read_key(source, KEY_NUMERIC_PRECISION),
            show_fields_as_scalars: read_key(source, KEY_SHOW_FIELDS_AS_SCALARS),
        }
    }

    pub fn write_to(&self, sink: &mut dyn StateSink) {
        if let Some(tab) = self.active_tab {
            sink.put_integer(KEY_ACTIVE_TAB, tab as i64);
        }
        if let Some(format) = self.format_numbers {
            sink.put_boolean(KEY_FORMAT_NUMBERS, format);
        }
        if let Some(precision) = self.numeric_precision {
            sink.put_integer(KEY_NUMERIC_PRECISION, i64::from(precision));
        }
        if let Some(show) = self.show_fields_as_scalars {
            sink.put_boolean(KEY_SHOW_FIELDS_AS_SCALARS, show);
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ResViewError::ViewState(e.to_string()))
    }

    /// Parse a TOML document; unknown keys are ignored, malformed known keys skipped.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(text).map_err(|e| ResViewError::ViewState(e.to_string()))?;
        Ok(Self::read_from(&table))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

fn read_key<T: std::str::FromStr>(source: &dyn StateSource, key: &str) -> Option<T> {
    let raw = source.get(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            let error = ResViewError::InvalidStateValue {
                key: key.to_string(),
                value: raw,
            };
            warn!(%error, "ignoring saved setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_none() {
        let source: HashMap<String, String> = HashMap::new();
        assert_eq!(ViewState::read_from(&source), ViewState::default());
    }

    #[test]
    fn malformed_values_are_skipped() {
        let mut source = HashMap::new();
        source.insert(KEY_ACTIVE_TAB.to_string(), "two".to_string());
        source.insert(KEY_NUMERIC_PRECISION.to_string(), "3".to_string());
        source.insert(KEY_FORMAT_NUMBERS.to_string(), "-1".to_string());
        let state = ViewState::read_from(&source);
        assert_eq!(state.active_tab, None);
        assert_eq!(state.numeric_precision, Some(3));
        assert_eq!(state.format_numbers, None);
    }

    #[test]
    fn writes_typed_toml_values() {
        let state = ViewState {
            active_tab: Some(3),
            format_numbers: Some(false),
            numeric_precision: Some(4),
            show_fields_as_scalars: Some(true),
        };
        let mut table = toml::Table::new();
        state.write_to(&mut table);
        assert_eq!(table.get(KEY_ACTIVE_TAB), Some(&toml::Value::Integer(3)));
        assert_eq!(table.get(KEY_FORMAT_NUMBERS), Some(&toml::Value::Boolean(false)));
        assert_eq!(ViewState::read_from(&table), state);
    }

    #[test]
    fn toml_text_uses_camel_case_keys() {
        let state = ViewState {
            numeric_precision: Some(2),
            ..ViewState::default()
        };
        let text = state.to_toml_string().unwrap();
        assert!(text.contains("numericPrecision = 2"), "got: {text}");
        assert!(!text.contains("activeTab"), "got: {text}");
        assert_eq!(ViewState::from_toml_str(&text).unwrap(), state);
    }
}
