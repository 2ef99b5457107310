use std::{fs, io, path};

use clap::ValueEnum;
use log::*;
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Verbosity {
    #[serde(alias = "off")]
    Quiet,
    #[serde(alias = "warn")]
    Normal,
    #[serde(alias = "info")]
    Verbose,
    #[serde(alias = "debug")]
    VeryVerbose,
}

impl From<Verbosity> for LevelFilter {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Quiet => Self::Off,
            Verbosity::Normal => Self::Warn,
            Verbosity::Verbose => Self::Info,
            Verbosity::VeryVerbose => Self::Debug,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InitLoggerError {
    #[error("failed to open log file: {0}")]
    OpenLogFile(#[from] io::Error),
    #[error("failed to set logger (another logger has already been registered): {0}")]
    SetLog(#[from] log::SetLoggerError),
}

/// Terminal output follows `verbosity`; the file always keeps at least the
/// info level so every submission is on record.
pub fn init_logger(verbosity: Verbosity, log_file: &path::Path) -> Result<(), InitLoggerError> {
    let term_filter: LevelFilter = verbosity.into();
    let file_filter = term_filter.max(LevelFilter::Info);

    // dependencies are noisy at debug level and irrelevant to operators
    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("atlas_admin")
        .build();

    simplelog::CombinedLogger::init(vec![
        simplelog::TermLogger::new(
            term_filter,
            config.clone(),
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        ),
        simplelog::WriteLogger::new(
            file_filter,
            config,
            fs::File::options().append(true).create(true).open(log_file)?,
        ),
    ])?;

    debug!("Logging to {} (terminal level {term_filter})", log_file.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(LevelFilter::from(Verbosity::Quiet), LevelFilter::Off);
        assert_eq!(LevelFilter::from(Verbosity::VeryVerbose), LevelFilter::Debug);
    }

    #[test]
    fn verbosity_accepts_level_aliases() {
        let parsed: Verbosity = serde_json::from_str("\"info\"").unwrap();
        assert_eq!(parsed, Verbosity::Verbose);

        let parsed: Verbosity = serde_json::from_str("\"very-verbose\"").unwrap();
        assert_eq!(parsed, Verbosity::VeryVerbose);
    }
}
