//! Adjustment configuration tree
//!
//! A [`Configuration`] is a string keyed tree of [`ConfigValue`]s that is always
//! paired with a content hash. The hash is the lowercase hex SHA-256 of the
//! canonical JSON rendering (keys sorted) and is recomputed on every mutation,
//! so it can be used directly as a cache key for derived images.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MediaError, MediaResult};

/// A single node of the configuration tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    String(String),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert an arbitrary JSON value, rejecting shapes the tree cannot hold
    /// (null, floats, arrays).
    pub fn from_json(value: serde_json::Value) -> MediaResult<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(ConfigValue::Bool(b)),
            serde_json::Value::String(s) => Ok(ConfigValue::String(s)),
            serde_json::Value::Number(n) => n.as_i64().map(ConfigValue::Integer).ok_or_else(|| {
                MediaError::InvalidConfiguration(format!("Only integer numbers are supported: {}", n))
            }),
            serde_json::Value::Object(object) => {
                let mut map = BTreeMap::new();
                for (key, value) in object {
                    map.insert(key, ConfigValue::from_json(value)?);
                }
                Ok(ConfigValue::Map(map))
            }
            other => Err(MediaError::InvalidConfiguration(format!(
                "Unsupported configuration value: {}",
                other
            ))),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
            ConfigValue::Integer(i) => serde_json::Value::from(*i),
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(value as i64)
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Integer(value as i64)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<BTreeMap<String, ConfigValue>> for ConfigValue {
    fn from(value: BTreeMap<String, ConfigValue>) -> Self {
        ConfigValue::Map(value)
    }
}

/// Parameter tree of an adjustment (or of output options) plus its content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ConfigValue>",
    into = "BTreeMap<String, ConfigValue>"
)]
pub struct Configuration {
    values: BTreeMap<String, ConfigValue>,
    hash: String,
}

impl Configuration {
    pub fn new() -> Self {
        Self::from_map(BTreeMap::new())
    }

    pub fn from_map(values: BTreeMap<String, ConfigValue>) -> Self {
        let hash = Self::compute_hash(&values);
        Self { values, hash }
    }

    /// Parse a JSON object into a configuration tree
    pub fn from_json_str(json: &str) -> MediaResult<Self> {
        match ConfigValue::from_json(serde_json::from_str(json)?)? {
            ConfigValue::Map(values) => Ok(Self::from_map(values)),
            other => Err(MediaError::InvalidConfiguration(format!(
                "Expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Content hash of the current tree
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn values(&self) -> &BTreeMap<String, ConfigValue> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Canonical JSON rendering the hash is computed from
    pub fn canonical_json(&self) -> String {
        Self::render(&self.values)
    }

    /// Look up a value by dot separated path (`"a.b.c"`)
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(ConfigValue::as_str)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(ConfigValue::as_i64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(ConfigValue::as_bool)
    }

    /// Set a value at `path`, creating intermediate maps and replacing scalars
    /// that are in the way.
    pub fn set(&mut self, path: &str, value: impl Into<ConfigValue>) -> MediaResult<()> {
        let segments = Self::parse_path(path)?;
        Self::set_in(&mut self.values, &segments, value.into());
        self.refresh_hash();
        Ok(())
    }

    /// Remove the value at `path`; removing an absent path is a no-op.
    pub fn unset(&mut self, path: &str) -> MediaResult<()> {
        let segments = Self::parse_path(path)?;
        Self::unset_in(&mut self.values, &segments);
        self.refresh_hash();
        Ok(())
    }

    /// Recursive merge where values of `other` win; nested maps merge key-wise.
    pub fn merge_overrule(&self, other: &Configuration) -> Configuration {
        let mut merged = self.values.clone();
        Self::merge_into(&mut merged, &other.values);
        Configuration::from_map(merged)
    }

    fn parse_path(path: &str) -> MediaResult<Vec<&str>> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(MediaError::invalid_adjustment(
                path,
                path,
                "configuration path must not contain empty segments",
            ));
        }
        Ok(segments)
    }

    fn set_in(map: &mut BTreeMap<String, ConfigValue>, segments: &[&str], value: ConfigValue) {
        match segments {
            [] => {}
            [last] => {
                map.insert((*last).to_string(), value);
            }
            [first, rest @ ..] => {
                let mut child = match map.remove(*first) {
                    Some(ConfigValue::Map(child)) => child,
                    _ => BTreeMap::new(),
                };
                Self::set_in(&mut child, rest, value);
                map.insert((*first).to_string(), ConfigValue::Map(child));
            }
        }
    }

    fn unset_in(map: &mut BTreeMap<String, ConfigValue>, segments: &[&str]) {
        match segments {
            [] => {}
            [last] => {
                map.remove(*last);
            }
            [first, rest @ ..] => {
                if let Some(ConfigValue::Map(child)) = map.get_mut(*first) {
                    Self::unset_in(child, rest);
                }
            }
        }
    }

    fn merge_into(
        target: &mut BTreeMap<String, ConfigValue>,
        source: &BTreeMap<String, ConfigValue>,
    ) {
        for (key, value) in source {
            match (target.get_mut(key), value) {
                (Some(ConfigValue::Map(existing)), ConfigValue::Map(incoming)) => {
                    Self::merge_into(existing, incoming);
                }
                _ => {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }

    fn refresh_hash(&mut self) {
        self.hash = Self::compute_hash(&self.values);
    }

    fn render(values: &BTreeMap<String, ConfigValue>) -> String {
        ConfigValue::Map(values.clone()).to_json().to_string()
    }

    fn compute_hash(values: &BTreeMap<String, ConfigValue>) -> String {
        hex::encode(Sha256::digest(Self::render(values).as_bytes()))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<String, ConfigValue>> for Configuration {
    fn from(values: BTreeMap<String, ConfigValue>) -> Self {
        Configuration::from_map(values)
    }
}

impl From<Configuration> for BTreeMap<String, ConfigValue> {
    fn from(configuration: Configuration) -> Self {
        configuration.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Configuration {
        let mut config = Configuration::new();
        config.set("verticalPosition", "top").unwrap();
        config.set("verticalOffset", 0i64).unwrap();
        config.set("watermark.source", "path").unwrap();
        config.set("watermark.reference", "/tmp/logo.png").unwrap();
        config
    }

    #[test]
    fn test_hash_is_repeatable() {
        assert_eq!(sample().hash(), sample().hash());
        assert_eq!(sample().hash().len(), 64);
    }

    #[test]
    fn test_hash_independent_of_insertion_order() {
        let mut a = Configuration::new();
        a.set("x", 1i64).unwrap();
        a.set("y", 2i64).unwrap();
        let mut b = Configuration::new();
        b.set("y", 2i64).unwrap();
        b.set("x", 1i64).unwrap();
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_nested_set_and_get() {
        let config = sample();
        assert_eq!(config.get_str("watermark.reference"), Some("/tmp/logo.png"));
        assert_eq!(config.get_i64("verticalOffset"), Some(0));
        assert!(config.get("watermark.missing").is_none());
        assert!(config.get("verticalOffset.deeper").is_none());
    }

    #[test]
    fn test_nested_mutation_changes_hash() {
        let mut config = sample();
        let before = config.hash().to_string();
        config.set("watermark.reference", "/tmp/other.png").unwrap();
        assert_ne!(before, config.hash());
    }

    #[test]
    fn test_unset_changes_hash_and_is_noop_when_absent() {
        let mut config = sample();
        let before = config.hash().to_string();
        config.unset("watermark.reference").unwrap();
        assert_ne!(before, config.hash());
        assert!(config.get("watermark.reference").is_none());

        let after_first = config.hash().to_string();
        config.unset("watermark.reference").unwrap();
        config.unset("not.there").unwrap();
        assert_eq!(after_first, config.hash());
    }

    #[test]
    fn test_set_replaces_scalar_in_path() {
        let mut config = Configuration::new();
        config.set("a", 1i64).unwrap();
        config.set("a.b", "nested").unwrap();
        assert_eq!(config.get_str("a.b"), Some("nested"));
    }

    #[test]
    fn test_empty_path_segments_rejected() {
        let mut config = sample();
        let before = config.clone();
        assert!(matches!(
            config.set("a..b", 1i64),
            Err(MediaError::InvalidAdjustmentConfiguration { .. })
        ));
        assert!(config.unset("").is_err());
        assert_eq!(before, config);
    }

    #[test]
    fn test_integer_and_string_leaves_hash_differently() {
        let mut a = Configuration::new();
        a.set("quality", 90i64).unwrap();
        let mut b = Configuration::new();
        b.set("quality", "90").unwrap();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_merge_overrule_prefers_other() {
        let defaults = Configuration::from_json_str(
            r#"{"quality": 90, "png": {"filter": "adaptive", "interlace": false}}"#,
        )
        .unwrap();
        let overrides =
            Configuration::from_json_str(r#"{"quality": 70, "png": {"interlace": true}}"#).unwrap();

        let merged = defaults.merge_overrule(&overrides);
        assert_eq!(merged.get_i64("quality"), Some(70));
        assert_eq!(merged.get_str("png.filter"), Some("adaptive"));
        assert_eq!(merged.get_bool("png.interlace"), Some(true));
    }

    #[test]
    fn test_serde_round_trip_keeps_hash() {
        let config = sample();
        let json = serde_json::to_string(&config).unwrap();
        let restored: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(config.hash(), restored.hash());
        assert_eq!(config, restored);
    }

    #[test]
    fn test_from_json_rejects_floats_and_arrays() {
        assert!(Configuration::from_json_str(r#"{"quality": 9.5}"#).is_err());
        assert!(Configuration::from_json_str(r#"{"list": [1, 2]}"#).is_err());
        assert!(Configuration::from_json_str(r#"[1]"#).is_err());
    }

    fn leaf() -> impl Strategy<Value = ConfigValue> {
        prop_oneof![
            any::<bool>().prop_map(ConfigValue::Bool),
            any::<i64>().prop_map(ConfigValue::Integer),
            "[a-z0-9 ]{0,12}".prop_map(ConfigValue::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_single_leaf_change_changes_hash(
            entries in proptest::collection::btree_map("[a-z]{1,6}", leaf(), 1..8),
            replacement in leaf(),
            pick in any::<prop::sample::Index>(),
        ) {
            let config = Configuration::from_map(entries.clone());
            let keys: Vec<&String> = entries.keys().collect();
            let key = keys[pick.index(keys.len())];
            prop_assume!(entries.get(key) != Some(&replacement));

            let mut mutated = config.clone();
            mutated.set(key, replacement).unwrap();
            prop_assert_ne!(config.hash(), mutated.hash());
        }

        #[test]
        fn prop_hash_is_deterministic(
            entries in proptest::collection::btree_map("[a-z]{1,6}", leaf(), 0..8),
        ) {
            let a = Configuration::from_map(entries.clone());
            let b = Configuration::from_map(entries);
            prop_assert_eq!(a.hash(), b.hash());
        }
    }
}
