pub mod value_type;
pub mod wrapper;

pub use crate::domain::model::{ConfigMap, ConfigValue, Defaults};
pub use crate::domain::ports::{ConfigStore, FromConfigValue, ValueType};
pub use crate::utils::error::Result;
