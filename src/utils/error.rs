use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML rendering error: {0}")]
    TomlError(#[from] toml::ser::Error),

    #[error("Config file '{path}' must contain a JSON object, found {found}")]
    NotAnObjectError { path: String, found: String },

    #[error("Default config is unavailable: {message}")]
    DefaultsError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Unknown value type: {name}")]
    UnknownValueTypeError { name: String },

    #[error("Conversion error: {message}")]
    ConversionError { message: String },

    #[error("Logger setup failed: {message}")]
    LoggerError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

impl ConfigError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ConfigError::IoError(_) => "Check that the file exists and that you have permission to access it",
            ConfigError::SerializationError(_) => "Fix the JSON syntax of the config file, or delete it to regenerate it from defaults",
            ConfigError::TomlError(_) => "TOML cannot represent null values; use the JSON output format instead",
            ConfigError::NotAnObjectError { .. } => "The top level of a config file must be a JSON object",
            ConfigError::DefaultsError { .. } => "Make sure the defaults file exists and contains a JSON object",
            ConfigError::InvalidConfigValueError { .. } => "Correct the highlighted value and try again",
            ConfigError::MissingConfigError { .. } => "Set the key first, or add it to the defaults",
            ConfigError::UnknownValueTypeError { .. } => "Run the `types` command to list the available value types",
            ConfigError::ConversionError { .. } => "Check that the stored value has the requested type",
            ConfigError::LoggerError { .. } => "Check the log file path, or run without a log file",
            ConfigError::StorageError { .. } => "Retry the operation; the storage backend is in an inconsistent state",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
