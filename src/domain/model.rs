use crate::domain::ports::{FromConfigValue, ValueType};
use crate::utils::error::{ConfigError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Config entries in document order.
pub type ConfigMap = IndexMap<String, ConfigValue>;

/// One value read from a config file. `null` doubles as "no value".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigValue(Value);

impl ConfigValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn null() -> Self {
        Self(Value::Null)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn to_value<T: FromConfigValue>(&self) -> Option<T> {
        T::from_config_value(&self.0)
    }

    pub fn to_value_or<T: FromConfigValue>(&self, default: T) -> T {
        self.to_value().unwrap_or(default)
    }

    pub fn convert<V: ValueType>(&self, value_type: &V) -> Option<V::Output> {
        value_type.convert(&self.0)
    }

    pub fn from_values(values: Vec<Value>) -> Vec<ConfigValue> {
        values.into_iter().map(ConfigValue).collect()
    }

    pub fn from_map(map: Map<String, Value>) -> ConfigMap {
        map.into_iter().map(|(k, v)| (k, ConfigValue(v))).collect()
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Option<Value>> for ConfigValue {
    fn from(value: Option<Value>) -> Self {
        Self(value.unwrap_or(Value::Null))
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        value.0
    }
}

/// Where a wrapper's default values come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Defaults {
    File(PathBuf),
    Map(ConfigMap),
}

impl Defaults {
    pub fn empty() -> Self {
        Defaults::Map(ConfigMap::new())
    }

    /// Builds in-memory defaults from a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Defaults::Map(ConfigValue::from_map(map))),
            other => Err(ConfigError::InvalidConfigValueError {
                field: "defaults".to_string(),
                value: other.to_string(),
                reason: "Defaults must be a JSON object".to_string(),
            }),
        }
    }
}

impl From<PathBuf> for Defaults {
    fn from(path: PathBuf) -> Self {
        Defaults::File(path)
    }
}

impl From<&Path> for Defaults {
    fn from(path: &Path) -> Self {
        Defaults::File(path.to_path_buf())
    }
}

impl From<ConfigMap> for Defaults {
    fn from(map: ConfigMap) -> Self {
        Defaults::Map(map)
    }
}

impl From<Map<String, Value>> for Defaults {
    fn from(map: Map<String, Value>) -> Self {
        Defaults::Map(ConfigValue::from_map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transparent_serialization() {
        let value = ConfigValue::new(json!({"a": [1, 2]}));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":[1,2]}"#);

        let back: ConfigValue = serde_json::from_str("true").unwrap();
        assert_eq!(back, ConfigValue::new(true));
    }

    #[test]
    fn test_from_map_keeps_document_order() {
        let map = match json!({"zeta": 1, "alpha": 2, "mid": 3}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let keys: Vec<String> = ConfigValue::from_map(map).into_keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_from_values_wraps_each_element() {
        let wrapped = ConfigValue::from_values(vec![json!(1), json!("two"), Value::Null]);
        assert_eq!(wrapped.len(), 3);
        assert!(wrapped[2].is_null());
        assert_eq!(wrapped[1].value(), &json!("two"));
    }

    #[test]
    fn test_missing_value_is_null() {
        assert!(ConfigValue::from(None).is_null());
        assert_eq!(ConfigValue::default(), ConfigValue::null());
    }

    #[test]
    fn test_defaults_from_value() {
        let defaults = Defaults::from_value(json!({"volume": 7})).unwrap();
        match defaults {
            Defaults::Map(map) => assert_eq!(map["volume"], ConfigValue::new(7)),
            Defaults::File(_) => panic!("expected in-memory defaults"),
        }

        assert!(Defaults::from_value(json!([1, 2])).is_err());
    }
}
