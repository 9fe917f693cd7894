//! Shared fixtures for the `when` parser integration tests

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use oh_registries::{Registries, RegistrySnapshot};
use oh_triggers::WhenParser;

/// Load a fixture file as a string
///
/// Fixtures are stored in the `tests/fixtures/` directory.
pub fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);

    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture '{}' from {:?}: {}", name, path, e))
}

/// Registries seeded from `registry.yaml`
pub fn registries() -> Arc<Registries> {
    let snapshot: RegistrySnapshot = serde_yaml::from_str(&load_fixture("registry.yaml"))
        .unwrap_or_else(|e| panic!("Failed to parse registry fixture: {}", e));
    Arc::new(Registries::from_snapshot(snapshot).unwrap())
}

/// Parser over the fixture registries
pub fn parser() -> WhenParser {
    WhenParser::new(registries())
}

/// Log sink shared with a test subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with every log record written to the returned sink
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs)
}
