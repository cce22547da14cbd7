//! tracing subscriber setup.

use dovbo_config::{LogFormat, LogLevel, LoggingConfig};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Crates whose logs follow the configured level; everything else logs warnings only.
const OWN_TARGETS: [&str; 5] = [
    "dovbobot",
    "dovbo_ai",
    "dovbo_config",
    "dovbo_telegram",
    "dovbo_common",
];

/// Filter directives for the given level.
pub fn directives(level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(OWN_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

fn env_filter(level: &str, fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives(level)))
        .unwrap_or_else(|_| EnvFilter::new(directives(fallback)))
}

/// Subscriber for config loading, before the config has picked a format.
/// Logs go to stderr so `--print-config` output stays clean.
pub fn bootstrap(level_override: Option<&str>) -> impl Subscriber + Send + Sync {
    bootstrap_to(level_override, std::io::stderr)
}

fn bootstrap_to<W>(level_override: Option<&str>, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let fallback = LogLevel::default().as_filter();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level_override.unwrap_or(fallback), fallback))
        .with_writer(writer)
        .finish()
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level_override`,
/// which takes precedence over the config.
pub fn init(config: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(config.level.as_filter());
    let filter = env_filter(level, config.level.as_filter());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn config_loading_logs_reach_bootstrap_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.toml");
        std::fs::write(&path, "[interlocutor]\nhistory_size = 5\n").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = bootstrap_to(Some("info"), move || writer.clone());
        let config = tracing::subscriber::with_default(subscriber, || {
            dovbo_config::resolve_config("default", Some(&path))
        })
        .unwrap();

        assert_eq!(config.interlocutor.history_size, 5);
        assert!(captured.text().contains("loaded config from"));
    }

    #[test]
    fn directives_scope_level_to_own_crates() {
        let d = directives("debug");
        assert!(d.starts_with("warn,"));
        assert!(d.contains("dovbo_ai=debug"));
        assert!(d.contains("dovbobot=debug"));
        assert!(EnvFilter::try_new(d).is_ok());
    }
}
