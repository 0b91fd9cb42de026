use crate::utils::error::Result;
use serde_json::Value;
use std::path::Path;

/// Where config files live. Paths are passed through untouched.
pub trait ConfigStore {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Replaces the file, creating missing parent directories.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
    fn remove(&self, path: &Path) -> Result<()>;
}

/// A named conversion from a raw JSON value to a Rust value.
pub trait ValueType {
    type Output;

    fn name(&self) -> &'static str;

    /// Whether `value` is natively of this type.
    fn matches(&self, value: &Value) -> bool;

    fn convert(&self, value: &Value) -> Option<Self::Output>;

    fn convert_or(&self, value: &Value, default: Self::Output) -> Self::Output {
        self.convert(value).unwrap_or(default)
    }
}

/// Rust types a config value can be read as. The type of the requested value
/// picks the conversion, so `to_value_or(0_i64)` reads an integer.
pub trait FromConfigValue: Sized {
    fn from_config_value(value: &Value) -> Option<Self>;
}
