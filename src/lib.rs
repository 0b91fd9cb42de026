pub mod adapters;
#[cfg(feature = "cli")]
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::{FileStore, MemoryStore};
pub use core::value_type::{Bool, Double, DynValueType, Int, Str, TypeRegistry, ValueList, ValueMap};
pub use core::wrapper::ConfigWrapper;
pub use domain::model::{ConfigMap, ConfigValue, Defaults};
pub use domain::ports::{ConfigStore, FromConfigValue, ValueType};
pub use utils::error::{ConfigError, Result};
