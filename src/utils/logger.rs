//! Logging setup.
//!
//! The library itself only emits `tracing` events. This module turns them into
//! pattern-formatted lines (see [`MessagePattern`]) on stdout and, optionally,
//! a log file. Events can be muted for the current thread with
//! [`without_logging`] or process-wide with [`disable_logging`]; both only
//! affect subscribers built through [`LoggerBuilder`].

use crate::utils::error::{ConfigError, Result};
use chrono::{Local, NaiveDateTime};
use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::subscriber::Interest;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub const DEFAULT_LOGGER_NAME: &str = "jsonconf";
pub const DEFAULT_PATTERN: &str = "`HH`:`mm`:`ss` `log-name` [`lvl`] `msg`";

const ANSI_RESET: &str = "\u{1b}[0m";

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

thread_local! {
    static SUPPRESSION_DEPTH: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    #[default]
    All,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Off,
}

impl LogLevel {
    const ORDERED: [LogLevel; 8] = [
        LogLevel::All,
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
        LogLevel::Off,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Off => "OFF",
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ORDERED.get(usize::from(index)).copied()
    }

    /// Fatal has no `tracing` counterpart and is filtered like Error.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::All | LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }

    fn ansi_color(self) -> &'static str {
        match self {
            LogLevel::All | LogLevel::Trace => "\u{1b}[37m",
            LogLevel::Debug => "\u{1b}[36m",
            LogLevel::Info => "\u{1b}[32m",
            LogLevel::Warn => "\u{1b}[33m",
            LogLevel::Error | LogLevel::Fatal => "\u{1b}[31m",
            LogLevel::Off => "",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        if level == Level::TRACE {
            LogLevel::Trace
        } else if level == Level::DEBUG {
            LogLevel::Debug
        } else if level == Level::INFO {
            LogLevel::Info
        } else if level == Level::WARN {
            LogLevel::Warn
        } else {
            LogLevel::Error
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ORDERED
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidConfigValueError {
                field: "log_level".to_string(),
                value: s.to_string(),
                reason: "Expected one of ALL, TRACE, DEBUG, INFO, WARN, ERROR, FATAL, OFF".to_string(),
            })
    }
}

/// A log line template made of literal text and back-ticked stamps.
///
/// Supported stamps: `yyyy`, `MM`, `dd`, `hh` (12-hour), `HH` (24-hour),
/// `a` (AM/PM), `mm`, `ss`, `SSS` (milliseconds), `msg`, `lvl` and
/// `log-name`. Unknown stamps render as nothing; a stamp left open at the end
/// of the pattern is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePattern {
    pattern: String,
}

impl MessagePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn format(
        &self,
        message: &str,
        logger_name: &str,
        level: LogLevel,
        at: NaiveDateTime,
    ) -> String {
        let mut formatted = String::with_capacity(self.pattern.len() + message.len());
        let mut stamp = String::new();
        let mut in_stamp = false;

        for c in self.pattern.chars() {
            match (in_stamp, c) {
                (false, '`') => in_stamp = true,
                (false, c) => formatted.push(c),
                (true, '`') => {
                    render_stamp(&mut formatted, &stamp, message, logger_name, level, at);
                    stamp.clear();
                    in_stamp = false;
                }
                (true, c) => stamp.push(c),
            }
        }

        formatted
    }
}

impl Default for MessagePattern {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

fn render_stamp(
    out: &mut String,
    stamp: &str,
    message: &str,
    logger_name: &str,
    level: LogLevel,
    at: NaiveDateTime,
) {
    let time_format = match stamp {
        "msg" => return out.push_str(message),
        "log-name" => return out.push_str(logger_name),
        "lvl" => return out.push_str(level.as_str()),
        "yyyy" => "%Y",
        "MM" => "%m",
        "dd" => "%d",
        "hh" => "%I",
        "HH" => "%H",
        "a" => "%p",
        "mm" => "%M",
        "ss" => "%S",
        "SSS" => "%3f",
        _ => return,
    };
    // Writing into a String cannot fail.
    let _ = write!(out, "{}", at.format(time_format));
}

struct PatternFormatter {
    name: String,
    pattern: MessagePattern,
}

impl<S, N> FormatEvent<S, N> for PatternFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let level = LogLevel::from(*event.metadata().level());
        let line = self
            .pattern
            .format(&message, &self.name, level, Local::now().naive_local());

        if writer.has_ansi_escapes() {
            writeln!(writer, "{}{}{}", level.ansi_color(), line, ANSI_RESET)
        } else {
            writeln!(writer, "{}", line)
        }
    }
}

/// Drops events while logging is disabled or suppressed. Interest stays
/// "sometimes" so the check runs for every event instead of being cached.
struct SuppressionLayer;

impl<S: Subscriber> Layer<S> for SuppressionLayer {
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, _metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        logging_active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pattern,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    name: String,
    level: LogLevel,
    pattern: MessagePattern,
    log_file: Option<PathBuf>,
    format: LogFormat,
    ansi: bool,
    respect_env: bool,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: LogLevel::All,
            pattern: MessagePattern::default(),
            log_file: None,
            format: LogFormat::Pattern,
            ansi: true,
            respect_env: true,
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn pattern(mut self, pattern: MessagePattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Mirrors every line (without colours) into `path`, truncating it first.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// When set (the default), `RUST_LOG` takes precedence over the level.
    pub fn respect_env(mut self, respect_env: bool) -> Self {
        self.respect_env = respect_env;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.level_filter().to_string());
        if self.respect_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
        } else {
            fallback()
        }
    }

    fn output_layer<W>(&self, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        match self.format {
            LogFormat::Pattern => tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_writer(writer)
                .event_format(PatternFormatter {
                    name: self.name.clone(),
                    pattern: self.pattern.clone(),
                })
                .with_filter(self.env_filter())
                .boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(self.env_filter())
                .boxed(),
        }
    }

    pub fn build_with_writer<W>(self, writer: W) -> Result<impl Subscriber + Send + Sync>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let mut layers = vec![self.output_layer(writer, self.ansi)];

        if let Some(path) = &self.log_file {
            let file = File::create(path).map_err(|e| ConfigError::LoggerError {
                message: format!("cannot create log file '{}': {}", path.display(), e),
            })?;
            layers.push(self.output_layer(Mutex::new(file), false));
        }

        Ok(tracing_subscriber::registry()
            .with(layers)
            .with(SuppressionLayer))
    }

    /// Installs the logger as the global default, writing to stdout.
    pub fn init(self) -> Result<()> {
        self.init_with_writer(std::io::stdout)
    }

    pub fn init_with_writer<W>(self, writer: W) -> Result<()>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        self.build_with_writer(writer)?
            .try_init()
            .map_err(|e| ConfigError::LoggerError {
                message: e.to_string(),
            })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LOGGER_NAME)
    }
}

/// Logger for the command-line tool. Lines go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_cli_logger(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { LogLevel::Debug } else { LogLevel::Warn };
    let mut builder = LoggerBuilder::default().level(level);
    if let Some(path) = log_file {
        builder = builder.log_file(path);
    }
    builder.init_with_writer(std::io::stderr)
}

/// Runs `f` with logging muted on the current thread.
pub fn without_logging<R>(f: impl FnOnce() -> R) -> R {
    struct Unmute;

    impl Drop for Unmute {
        fn drop(&mut self) {
            SUPPRESSION_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
        }
    }

    SUPPRESSION_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let _unmute = Unmute;
    f()
}

pub fn is_suppressed() -> bool {
    SUPPRESSION_DEPTH.with(|depth| depth.get() > 0)
}

pub fn disable_logging() {
    LOGGING_ENABLED.store(false, Ordering::SeqCst);
}

pub fn enable_logging() {
    LOGGING_ENABLED.store(true, Ordering::SeqCst);
}

pub fn is_logging_enabled() -> bool {
    LOGGING_ENABLED.load(Ordering::SeqCst)
}

fn logging_active() -> bool {
    is_logging_enabled() && !is_suppressed()
}
