use crate::config::{CliConfig, Command, OutputFormat};
use crate::core::value_type::TypeRegistry;
use crate::core::wrapper::ConfigWrapper;
use crate::domain::model::{ConfigMap, Defaults};
use crate::utils::error::{ConfigError, Result};
use serde_json::Value;
use std::io::Write;
use tracing::{info, warn};

pub fn open_wrapper(config: &CliConfig) -> ConfigWrapper {
    let defaults = match &config.defaults {
        Some(path) => Defaults::File(path.clone()),
        None => Defaults::empty(),
    };

    let wrapper = ConfigWrapper::open(config.config.clone(), defaults);
    if wrapper.is_broken() {
        warn!(
            "[{}] could not be used, serving default values",
            wrapper.path().display()
        );
    }
    wrapper
}

pub fn run<W: Write>(config: &CliConfig, registry: &TypeRegistry, out: &mut W) -> Result<()> {
    if let Command::Types = config.command {
        for name in registry.names() {
            writeln!(out, "{}", name)?;
        }
        return Ok(());
    }

    let mut wrapper = open_wrapper(config);

    match &config.command {
        Command::Show {
            format,
            from_defaults,
        } => {
            let map = if *from_defaults {
                wrapper.default_config()
            } else {
                wrapper.config()
            };
            writeln!(out, "{}", render(map, *format)?.trim_end())?;
        }
        Command::Get {
            key,
            as_type,
            fallback,
        } => {
            let value = if *fallback {
                wrapper.get_or_default(key)
            } else {
                wrapper.get(key)
            };
            if value.is_null() {
                return Err(ConfigError::MissingConfigError { field: key.clone() });
            }

            let value = match as_type {
                Some(name) => registry.coerce(name, value.value())?,
                None => value.into_inner(),
            };
            writeln!(out, "{}", display_value(&value))?;
        }
        Command::Set { key, value } => {
            wrapper.put_and_save(key.clone(), parse_value(value))?;
            info!("Saved '{}' to [{}]", key, wrapper.path().display());
        }
        Command::Reset => {
            if wrapper.delete()? {
                writeln!(out, "Deleted {}", wrapper.path().display())?;
            } else {
                writeln!(out, "{} was already absent", wrapper.path().display())?;
            }
        }
        Command::Types => {}
    }

    Ok(())
}

fn render(map: &ConfigMap, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(map)?),
        OutputFormat::Toml => Ok(toml::to_string_pretty(map)?),
    }
}

/// Strings print bare; everything else prints as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
