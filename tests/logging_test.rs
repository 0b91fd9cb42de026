use jsonconf::utils::logger::{LogFormat, LogLevel, LoggerBuilder};
use jsonconf::{Int, ValueType};
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_json_format_emits_structured_lines() {
    let buffer = SharedBuffer::default();
    let subscriber = LoggerBuilder::default()
        .level(LogLevel::Info)
        .format(LogFormat::Json)
        .respect_env(false)
        .build_with_writer(buffer.clone())
        .unwrap();

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("skipped");
        tracing::warn!(key = "volume", "value missing");
    });

    let line = buffer.contents();
    let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(parsed["level"], "WARN");
    assert_eq!(parsed["fields"]["message"], "value missing");
    assert_eq!(parsed["fields"]["key"], "volume");
}

#[test]
fn test_off_level_writes_nothing() {
    let buffer = SharedBuffer::default();
    let subscriber = LoggerBuilder::default()
        .level(LogLevel::Off)
        .respect_env(false)
        .build_with_writer(buffer.clone())
        .unwrap();

    tracing::subscriber::with_default(subscriber, || {
        tracing::error!("nobody hears this");
        assert_eq!(Int.name(), "int");
    });

    assert!(buffer.contents().is_empty());
}

#[test]
fn test_unwritable_log_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = LoggerBuilder::default()
        .log_file(temp_dir.path().join("missing-dir").join("log.txt"))
        .build_with_writer(SharedBuffer::default());

    assert!(result.is_err());
}
