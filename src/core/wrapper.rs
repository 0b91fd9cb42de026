use crate::adapters::storage::FileStore;
use crate::domain::model::{ConfigMap, ConfigValue, Defaults};
use crate::domain::ports::{ConfigStore, FromConfigValue, ValueType};
use crate::utils::error::{ConfigError, Result};
use crate::utils::validation::validate_file_stem;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

static NULL: Value = Value::Null;

/// A JSON config file paired with its default values.
///
/// Opening never fails: if the file cannot be generated or loaded the wrapper
/// is marked broken and serves the defaults instead. A `null` stored in the
/// file is treated as if the key were absent.
#[derive(Debug, Clone)]
pub struct ConfigWrapper<S = FileStore> {
    config: ConfigMap,
    default_config: ConfigMap,
    config_file: PathBuf,
    broken: bool,
    store: S,
}

impl ConfigWrapper<FileStore> {
    pub fn open(config_file: impl Into<PathBuf>, defaults: impl Into<Defaults>) -> Self {
        Self::open_with(FileStore, config_file, defaults)
    }

    /// Opens `<dir>/<file_stem>.json`.
    pub fn in_dir(
        dir: impl AsRef<Path>,
        file_stem: &str,
        defaults: impl Into<Defaults>,
    ) -> Result<Self> {
        validate_file_stem("file_stem", file_stem)?;
        Ok(Self::open(
            dir.as_ref().join(format!("{}.json", file_stem)),
            defaults,
        ))
    }
}

impl<S: ConfigStore> ConfigWrapper<S> {
    pub fn open_with(store: S, config_file: impl Into<PathBuf>, defaults: impl Into<Defaults>) -> Self {
        let config_file = config_file.into();

        let (default_config, defaults_loaded) = match defaults.into() {
            Defaults::File(path) => match load_map(&store, &path) {
                Ok(map) => (map, true),
                Err(e) => {
                    error!("Failed to load default config file [{}]: {}", path.display(), e);
                    (ConfigMap::new(), false)
                }
            },
            Defaults::Map(map) => (map, true),
        };

        let mut broken = false;

        if !store.exists(&config_file) {
            let generated = if defaults_loaded {
                render(&default_config).and_then(|contents| store.write(&config_file, &contents))
            } else {
                Err(ConfigError::DefaultsError {
                    message: "nothing to generate the config file from".to_string(),
                })
            };

            match generated {
                Ok(()) => debug!("Generated [{}] from defaults", config_file.display()),
                Err(e) => {
                    broken = true;
                    error!("Failed to generate [{}] config file: {}", config_file.display(), e);
                }
            }
        }

        let mut config = ConfigMap::new();
        if !broken {
            match load_map(&store, &config_file) {
                Ok(loaded) => config = loaded,
                Err(e) => {
                    broken = true;
                    error!("Failed to load [{}] config file: {}", config_file.display(), e);
                }
            }
        }

        if broken {
            config = default_config.clone();
        }

        Self {
            config,
            default_config,
            config_file,
            broken,
            store,
        }
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        present(self.config.get(key))
    }

    pub fn raw_from_default(&self, key: &str) -> Option<&Value> {
        present(self.default_config.get(key))
    }

    pub fn raw_or(&self, key: &str, default: Value) -> Value {
        self.raw(key).cloned().unwrap_or(default)
    }

    /// The config value, or the default-config value for the same key.
    pub fn raw_or_default(&self, key: &str) -> Option<&Value> {
        self.raw(key).or_else(|| self.raw_from_default(key))
    }

    pub fn get(&self, key: &str) -> ConfigValue {
        ConfigValue::from(self.raw(key).cloned())
    }

    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> ConfigValue {
        match self.raw(key) {
            Some(value) => ConfigValue::new(value.clone()),
            None => ConfigValue::new(default),
        }
    }

    pub fn get_or_default(&self, key: &str) -> ConfigValue {
        ConfigValue::from(self.raw_or_default(key).cloned())
    }

    pub fn get_from_default(&self, key: &str) -> ConfigValue {
        ConfigValue::from(self.raw_from_default(key).cloned())
    }

    /// Reads `key` as the type of `default`, returning `default` when the
    /// value is missing or of another type.
    pub fn get_as_or<T: FromConfigValue>(&self, key: &str, default: T) -> T {
        self.get(key).to_value_or(default)
    }

    /// Converts the config value with `value_type`, falling back to the
    /// converted default-config value.
    pub fn get_as<V: ValueType>(&self, key: &str, value_type: &V) -> Option<V::Output> {
        value_type
            .convert(self.raw(key).unwrap_or(&NULL))
            .or_else(|| value_type.convert(self.raw_from_default(key).unwrap_or(&NULL)))
    }

    /// Changes memory only; call [`save`](Self::save) to persist.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.config.insert(key.into(), ConfigValue::new(value));
        debug!(
            "Config was updated in memory. Call save() to write it to [{}]",
            self.config_file.display()
        );
    }

    pub fn put_all<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.config.extend(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), ConfigValue::new(value))),
        );
        debug!(
            "Config was updated in memory. Call save() to write it to [{}]",
            self.config_file.display()
        );
    }

    /// Replaces the config file with the in-memory config.
    pub fn save(&self) -> Result<()> {
        debug!("Trying to save config to [{}]...", self.config_file.display());

        match render(&self.config).and_then(|contents| self.store.write(&self.config_file, &contents)) {
            Ok(()) => {
                debug!("Successfully saved config to file");
                Ok(())
            }
            Err(e) => {
                error!("Unable to save config to [{}]: {}", self.config_file.display(), e);
                Err(e)
            }
        }
    }

    pub fn put_and_save(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.put(key, value);
        self.save()
    }

    pub fn put_all_and_save<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.put_all(entries);
        self.save()
    }

    /// Removes the config file. Returns `false` if it was already gone.
    pub fn delete(&self) -> Result<bool> {
        if !self.store.exists(&self.config_file) {
            warn!("Config file [{}] was already deleted!", self.config_file.display());
            return Ok(false);
        }

        self.store.remove(&self.config_file)?;
        warn!(
            "Config file [{}] was deleted. It will be regenerated from defaults on the next open",
            self.config_file.display()
        );
        Ok(true)
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    pub fn default_config(&self) -> &ConfigMap {
        &self.default_config
    }

    pub fn path(&self) -> &Path {
        &self.config_file
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn present(value: Option<&ConfigValue>) -> Option<&Value> {
    value.map(ConfigValue::value).filter(|v| !v.is_null())
}

fn load_map<S: ConfigStore>(store: &S, path: &Path) -> Result<ConfigMap> {
    let content = store.read_to_string(path)?;
    if content.trim().is_empty() {
        debug!("[{}] is empty, loading no values", path.display());
        return Ok(ConfigMap::new());
    }

    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => {
            debug!("Loaded {} values from [{}]", map.len(), path.display());
            Ok(ConfigValue::from_map(map))
        }
        Value::Null => Ok(ConfigMap::new()),
        other => Err(ConfigError::NotAnObjectError {
            path: path.display().to_string(),
            found: json_kind(&other).to_string(),
        }),
    }
}

fn render(map: &ConfigMap) -> Result<String> {
    let mut contents = serde_json::to_string_pretty(map)?;
    contents.push('\n');
    Ok(contents)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStore;
    use crate::core::value_type::{Bool, Int, Str};
    use serde_json::json;

    fn defaults() -> Defaults {
        Defaults::from_value(json!({"volume": 7, "name": "demo", "debug": false})).unwrap()
    }

    fn store_with(contents: &str) -> MemoryStore {
        MemoryStore::new().with_file("app.json", contents).unwrap()
    }

    #[test]
    fn test_generates_missing_file_from_defaults() {
        let store = MemoryStore::new();
        let wrapper = ConfigWrapper::open_with(store.clone(), "app.json", defaults());

        assert!(!wrapper.is_broken());
        assert_eq!(
            store.contents(Path::new("app.json")).unwrap(),
            "{\n  \"volume\": 7,\n  \"name\": \"demo\",\n  \"debug\": false\n}\n"
        );
        assert_eq!(wrapper.get_as("volume", &Int), Some(7));
        assert_eq!(wrapper.config(), wrapper.default_config());
    }

    #[test]
    fn test_existing_file_overrides_defaults() {
        let store = store_with(r#"{"volume": 3}"#);
        let wrapper = ConfigWrapper::open_with(store, "app.json", defaults());

        assert!(!wrapper.is_broken());
        assert_eq!(wrapper.get("volume").value(), &json!(3));
        assert!(wrapper.get("name").is_null());
        assert_eq!(wrapper.get_or_default("name").value(), &json!("demo"));
        assert_eq!(wrapper.get_from_default("volume").value(), &json!(7));
        assert_eq!(wrapper.raw_or_default("volume"), Some(&json!(3)));
        assert_eq!(wrapper.raw_or_default("missing"), None);
    }

    #[test]
    fn test_null_counts_as_absent() {
        let store = store_with(r#"{"name": null}"#);
        let wrapper = ConfigWrapper::open_with(store, "app.json", defaults());

        assert_eq!(wrapper.raw("name"), None);
        assert_eq!(wrapper.get_as("name", &Str).as_deref(), Some("demo"));
        assert_eq!(wrapper.get_or("name", "given").value(), &json!("given"));
        assert_eq!(wrapper.raw_or("name", json!(1)), json!(1));
    }

    #[test]
    fn test_get_as_falls_back_to_default_on_type_mismatch() {
        let store = store_with(r#"{"volume": "loud", "debug": "yes"}"#);
        let wrapper = ConfigWrapper::open_with(store, "app.json", defaults());

        assert_eq!(wrapper.get_as("volume", &Int), Some(7));
        assert_eq!(wrapper.get_as("debug", &Bool), Some(false));
        assert_eq!(wrapper.get_as("nowhere", &Int), None);
        assert_eq!(wrapper.get_as_or("volume", 11_i64), 11);
    }

    #[test]
    fn test_corrupt_file_marks_broken_and_serves_defaults() {
        let store = store_with("{ not json");
        let wrapper = ConfigWrapper::open_with(store, "app.json", defaults());

        assert!(wrapper.is_broken());
        assert_eq!(wrapper.config(), wrapper.default_config());
        assert_eq!(wrapper.get_as("volume", &Int), Some(7));
    }

    #[test]
    fn test_non_object_file_marks_broken() {
        let store = store_with("[1, 2, 3]");
        let wrapper = ConfigWrapper::open_with(store, "app.json", defaults());

        assert!(wrapper.is_broken());
        assert_eq!(wrapper.get("name").value(), &json!("demo"));
    }

    #[test]
    fn test_empty_file_loads_no_values() {
        let store = store_with("  \n");
        let wrapper = ConfigWrapper::open_with(store, "app.json", defaults());

        assert!(!wrapper.is_broken());
        assert!(wrapper.config().is_empty());
        assert_eq!(wrapper.get_or_default("volume").value(), &json!(7));
    }

    #[test]
    fn test_missing_defaults_file_and_missing_config() {
        let store = MemoryStore::new();
        let wrapper = ConfigWrapper::open_with(store.clone(), "app.json", PathBuf::from("defaults.json"));

        assert!(wrapper.is_broken());
        assert!(wrapper.config().is_empty());
        assert!(wrapper.default_config().is_empty());
        assert!(!store.exists(Path::new("app.json")));
    }

    #[test]
    fn test_missing_defaults_file_with_existing_config() {
        let store = store_with(r#"{"volume": 1}"#);
        let wrapper = ConfigWrapper::open_with(store, "app.json", PathBuf::from("defaults.json"));

        assert!(!wrapper.is_broken());
        assert!(wrapper.default_config().is_empty());
        assert_eq!(wrapper.get_as("volume", &Int), Some(1));
    }

    #[test]
    fn test_defaults_file_is_loaded_from_store() {
        let store = MemoryStore::new()
            .with_file("defaults.json", r#"{"theme": "dark", "size": 12.5}"#)
            .unwrap();
        let wrapper = ConfigWrapper::open_with(store.clone(), "app.json", PathBuf::from("defaults.json"));

        assert!(!wrapper.is_broken());
        assert_eq!(wrapper.get_as_or("theme", String::new()), "dark");
        assert_eq!(wrapper.get_as("size", &Int), Some(12));
        assert!(store.exists(Path::new("app.json")));
    }

    #[test]
    fn test_read_only_store_cannot_generate_or_save() {
        let mut wrapper = ConfigWrapper::open_with(MemoryStore::read_only(), "app.json", defaults());

        assert!(wrapper.is_broken());
        assert_eq!(wrapper.get_as("volume", &Int), Some(7));
        assert!(wrapper.put_and_save("volume", 9).is_err());
        assert_eq!(wrapper.get_as("volume", &Int), Some(9));
    }

    #[test]
    fn test_put_and_save_keeps_insertion_order() {
        let store = MemoryStore::new();
        let mut wrapper = ConfigWrapper::open_with(store.clone(), "app.json", defaults());

        wrapper.put("volume", 10);
        wrapper.put_all(vec![("extra", json!([1, 2])), ("name", json!("renamed"))]);
        wrapper.save().unwrap();

        assert_eq!(
            store.contents(Path::new("app.json")).unwrap(),
            "{\n  \"volume\": 10,\n  \"name\": \"renamed\",\n  \"debug\": false,\n  \"extra\": [\n    1,\n    2\n  ]\n}\n"
        );

        let reopened = ConfigWrapper::open_with(store, "app.json", defaults());
        assert_eq!(reopened.get_as("volume", &Int), Some(10));
        assert_eq!(reopened.get_as("name", &Str).as_deref(), Some("renamed"));
    }

    #[test]
    fn test_put_without_save_is_not_persisted() {
        let store = MemoryStore::new();
        let mut wrapper = ConfigWrapper::open_with(store.clone(), "app.json", defaults());

        wrapper.put("volume", 1);

        let reopened = ConfigWrapper::open_with(store, "app.json", defaults());
        assert_eq!(reopened.get_as("volume", &Int), Some(7));
    }

    #[test]
    fn test_delete_reports_whether_file_existed() {
        let store = MemoryStore::new();
        let wrapper = ConfigWrapper::open_with(store.clone(), "app.json", defaults());

        assert!(wrapper.delete().unwrap());
        assert!(!store.exists(Path::new("app.json")));
        assert!(!wrapper.delete().unwrap());
    }

    #[test]
    fn test_clone_is_independent() {
        let wrapper = ConfigWrapper::open_with(MemoryStore::new(), "app.json", defaults());
        let mut copy = wrapper.clone();

        copy.put("volume", 99);

        assert_eq!(copy.get_as("volume", &Int), Some(99));
        assert_eq!(wrapper.get_as("volume", &Int), Some(7));
        assert_eq!(copy.path(), wrapper.path());
    }
}
