//! Logging setup.
//!
//! A preset picks levels for the `parley::*` targets and `tower_http`.
//! `--log TARGET=LEVEL` adjusts single targets on top of it, and a set
//! `RUST_LOG` replaces both.

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup, turn summaries and failures
    #[default]
    Production,
    /// Adds store and gateway activity
    Verbose,
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    /// Most specific flag wins, except `quiet` which beats everything.
    fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (.., true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        }
    }

    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "parley::startup=info",
                "parley::api=info",
                "parley::turn=info",
                "parley::gateway=warn",
                "parley::store=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["parley=info", "tower_http=info"],
            LogPreset::Debug => &["parley=debug", "tower_http=debug"],
            LogPreset::Trace => &["parley=trace", "tower_http=trace"],
            LogPreset::Quiet => &["parley=warn", "tower_http=error"],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Applied after the preset, in command-line order.
    pub overrides: Vec<(String, Level)>,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let overrides = log_overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset: LogPreset::from_flags(verbose, debug, trace, quiet),
            overrides,
            format,
        }
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let directives: Vec<String> = self
            .preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(self.overrides.iter().map(|(target, level)| {
                format!("{}={}", target, level.as_str().to_ascii_lowercase())
            }))
            .collect();

        EnvFilter::try_new(directives.join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// `gateway=debug` becomes `parley::gateway` at DEBUG. Unknown levels are dropped.
fn parse_override(part: &str) -> Option<(String, Level)> {
    let (target, level) = part.split_once('=')?;
    let target = target.trim();
    let level = level.trim().parse::<Level>().ok()?;

    let target = if target.starts_with("parley") || target.starts_with("tower_http") {
        target.to_string()
    } else {
        format!("parley::{}", target)
    };
    Some((target, level))
}

pub fn init(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.build_filter());

    match config.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(overrides: &[&str]) -> LogConfig {
        LogConfig::from_cli(
            false,
            false,
            false,
            false,
            overrides.iter().map(|s| s.to_string()).collect(),
            LogFormat::Text,
        )
    }

    #[test]
    fn test_quiet_beats_other_flags() {
        assert_eq!(LogPreset::from_flags(true, true, true, true), LogPreset::Quiet);
        assert_eq!(LogPreset::from_flags(true, true, false, false), LogPreset::Debug);
        assert_eq!(LogPreset::from_flags(true, false, false, false), LogPreset::Verbose);
        assert_eq!(LogPreset::from_flags(false, false, false, false), LogPreset::Production);
    }

    #[test]
    fn test_log_format_values() {
        assert_eq!(LogFormat::from_str("json", true).unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("yaml", true).is_err());
    }

    #[test]
    fn test_overrides_get_parley_prefix() {
        let config = config_with(&["gateway=debug,store=TRACE", "tower_http=info"]);

        assert_eq!(
            config.overrides,
            vec![
                ("parley::gateway".to_string(), Level::DEBUG),
                ("parley::store".to_string(), Level::TRACE),
                ("tower_http".to_string(), Level::INFO),
            ]
        );
    }

    #[test]
    fn test_malformed_overrides_are_dropped() {
        let config = config_with(&["turn=loud", "api", "parley::api=warn"]);

        assert_eq!(config.overrides, vec![("parley::api".to_string(), Level::WARN)]);
    }
}
