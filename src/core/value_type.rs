//! Built-in value types and the name-based type registry.

use crate::domain::model::{ConfigMap, ConfigValue};
use crate::domain::ports::{FromConfigValue, ValueType};
use crate::utils::error::{ConfigError, Result};
use crate::utils::logger::without_logging;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

#[derive(Debug, Clone, Copy, Default)]
pub struct Int;

#[derive(Debug, Clone, Copy, Default)]
pub struct Double;

#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueList;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueMap;

impl ValueType for Str {
    type Output = String;

    fn name(&self) -> &'static str {
        "str"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_string()
    }

    fn convert(&self, value: &Value) -> Option<String> {
        debug!("Trying to convert '{}' to a string...", value);
        match value {
            Value::String(s) => {
                debug!("Successfully converted '{}' to a string", s);
                Some(s.clone())
            }
            _ => {
                debug!("Unable to convert '{}' to a string, because it is not a string!", value);
                None
            }
        }
    }
}

impl ValueType for Int {
    type Output = i64;

    fn name(&self) -> &'static str {
        "int"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_i64() || value.is_u64()
    }

    /// Accepts any number; fractions are truncated toward zero and
    /// out-of-range values saturate.
    fn convert(&self, value: &Value) -> Option<i64> {
        debug!("Trying to convert '{}' to an integer...", value);
        let converted = match value.as_i64() {
            Some(i) => Some(i),
            None if value.is_u64() => Some(i64::MAX),
            None => without_logging(|| Double.convert(value)).map(|d| d as i64),
        };
        match converted {
            Some(i) => debug!("Successfully converted '{}' to an integer", i),
            None => debug!("Unable to convert '{}' to an integer, because it is not a number!", value),
        }
        converted
    }
}

impl ValueType for Double {
    type Output = f64;

    fn name(&self) -> &'static str {
        "double"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_number()
    }

    fn convert(&self, value: &Value) -> Option<f64> {
        debug!("Trying to convert '{}' to a double...", value);
        let converted = value.as_f64();
        match converted {
            Some(d) => debug!("Successfully converted '{}' to a double", d),
            None => debug!("Unable to convert '{}' to a double, because it is not a number!", value),
        }
        converted
    }
}

impl ValueType for Bool {
    type Output = bool;

    fn name(&self) -> &'static str {
        "bool"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_boolean()
    }

    fn convert(&self, value: &Value) -> Option<bool> {
        debug!("Trying to convert '{}' to a boolean...", value);
        let converted = value.as_bool();
        match converted {
            Some(b) => debug!("Successfully converted '{}' to a boolean", b),
            None => debug!("Unable to convert '{}' to a boolean, because it is not a boolean!", value),
        }
        converted
    }
}

impl ValueType for ValueList {
    type Output = Vec<ConfigValue>;

    fn name(&self) -> &'static str {
        "list"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_array()
    }

    fn convert(&self, value: &Value) -> Option<Vec<ConfigValue>> {
        debug!("Trying to convert '{}' to a list of config values...", value);
        match value {
            Value::Array(items) => {
                debug!("Successfully converted a list of {} values", items.len());
                Some(ConfigValue::from_values(items.clone()))
            }
            _ => {
                debug!("Unable to convert '{}' to a list of config values, because it is not a list!", value);
                None
            }
        }
    }
}

impl ValueType for ValueMap {
    type Output = ConfigMap;

    fn name(&self) -> &'static str {
        "map"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn convert(&self, value: &Value) -> Option<ConfigMap> {
        debug!("Trying to convert '{}' to a map of config values...", value);
        match value {
            Value::Object(map) => {
                debug!("Successfully converted a map of {} entries", map.len());
                Some(ConfigValue::from_map(map.clone()))
            }
            _ => {
                debug!("Unable to convert '{}' to a map of config values, because it is not a map!", value);
                None
            }
        }
    }
}

macro_rules! from_config_value_via {
    ($($target:ty => $value_type:expr),* $(,)?) => {
        $(
            impl FromConfigValue for $target {
                fn from_config_value(value: &Value) -> Option<Self> {
                    $value_type.convert(value)
                }
            }
        )*
    };
}

from_config_value_via! {
    String => Str,
    i64 => Int,
    f64 => Double,
    bool => Bool,
    Vec<ConfigValue> => ValueList,
    ConfigMap => ValueMap,
}

impl FromConfigValue for i32 {
    fn from_config_value(value: &Value) -> Option<Self> {
        Int.convert(value)
            .map(|i| i.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }
}

impl FromConfigValue for ConfigValue {
    fn from_config_value(value: &Value) -> Option<Self> {
        Some(ConfigValue::new(value.clone()))
    }
}

impl FromConfigValue for Value {
    fn from_config_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Object-safe view of a [`ValueType`] whose output converts back to JSON.
pub trait DynValueType: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn accepts(&self, value: &Value) -> bool;
    fn coerce(&self, value: &Value) -> Option<Value>;
}

impl<T> DynValueType for T
where
    T: ValueType + Send + Sync,
    T::Output: Serialize,
{
    fn type_name(&self) -> &'static str {
        ValueType::name(self)
    }

    fn accepts(&self, value: &Value) -> bool {
        ValueType::matches(self, value)
    }

    fn coerce(&self, value: &Value) -> Option<Value> {
        self.convert(value)
            .and_then(|converted| serde_json::to_value(converted).ok())
    }
}

/// Value types addressable by name, checked in registration order.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: Vec<(String, Arc<dyn DynValueType>)>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("str", Str)
            .register("int", Int)
            .register("double", Double)
            .register("bool", Bool)
            .register("list", ValueList)
            .register("map", ValueMap);
        registry
    }

    /// Adds `value_type` under `name`, replacing any type already registered
    /// under that name (case-insensitively) in place.
    pub fn register<T>(&mut self, name: &str, value_type: T) -> &mut Self
    where
        T: DynValueType + 'static,
    {
        let value_type: Arc<dyn DynValueType> = Arc::new(value_type);
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value_type,
            None => self.entries.push((name.to_string(), value_type)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynValueType>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value_type)| Arc::clone(value_type))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn find_matching(&self, value: &Value) -> Option<&str> {
        let found = self
            .entries
            .iter()
            .find(|(_, value_type)| value_type.accepts(value))
            .map(|(name, _)| name.as_str());
        if found.is_none() {
            debug!("Couldn't find a value type for '{}'", value);
        }
        found
    }

    pub fn coerce(&self, name: &str, value: &Value) -> Result<Value> {
        let value_type = self.get(name).ok_or_else(|| ConfigError::UnknownValueTypeError {
            name: name.to_string(),
        })?;
        value_type
            .coerce(value)
            .ok_or_else(|| ConfigError::ConversionError {
                message: format!("'{}' cannot be read as {}", value, value_type.type_name()),
            })
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
