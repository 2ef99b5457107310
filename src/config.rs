use std::path::PathBuf;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{forms::FormLimits, lang::Language, logging::Verbosity};

pub const CONFIG_FILE: &str = "atlas-admin.toml";
pub const ENV_PREFIX: &str = "ATLAS_";

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "defaults::verbosity")]
    pub verbosity: Verbosity,

    #[serde(default = "defaults::log_file")]
    pub log_file: PathBuf,

    // unset => negotiated from the locale environment variables
    #[serde(default)]
    pub language: Option<Language>,

    #[serde(default = "defaults::fixtures")]
    pub fixtures: PathBuf,

    // username the console session starts as, if any
    #[serde(default)]
    pub login: Option<String>,

    #[serde(flatten)]
    pub limits: FormLimits,
}

impl Config {
    pub fn load(args: CliArgs) -> Result<Self, Box<figment::Error>> {
        Self::figment(args).extract().map_err(Box::new)
    }

    // merge semantic: bottom overrides top
    pub fn figment(args: CliArgs) -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(args)) // CLI
    }

    pub fn language(&self) -> Language {
        self.language.unwrap_or_else(Language::from_env)
    }
}

// separate from Config so that unset flags do not override the file or the
// environment; serde skips every `None` when handing this to figment
#[derive(Parser, Serialize, Deserialize, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// How much information to show and log [default: normal]
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    /// File to log to, in append mode [default: /tmp/atlas-admin.log]
    #[arg(short = 'f', long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Language for prompts and notifications [default: from $LANG]
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    /// TOML file with the users and maps to administer [default: fixtures.toml]
    #[arg(short = 'd', long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,

    /// Start the session logged in as this user [no default]
    #[arg(short = 'u', long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

mod defaults {
    use std::path::PathBuf;

    use crate::logging::Verbosity;

    pub const fn verbosity() -> Verbosity {
        Verbosity::Normal
    }

    pub fn log_file() -> PathBuf {
        PathBuf::from("/tmp/atlas-admin.log")
    }

    pub fn fixtures() -> PathBuf {
        PathBuf::from("fixtures.toml")
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_any_source() {
        Jail::expect_with(|_| {
            let config = Config::load(CliArgs::default()).expect("defaults are complete");

            assert_eq!(config.verbosity, Verbosity::Normal);
            assert_eq!(config.fixtures, PathBuf::from("fixtures.toml"));
            assert_eq!(config.limits, FormLimits::default());
            assert!(config.language.is_none());
            assert!(config.login.is_none());

            Ok(())
        });
    }

    #[test]
    fn cli_overrides_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                verbosity = "verbose"
                language = "fr"
                login = "admin"
                note_max_chars = 12
                "#,
            )?;
            jail.set_env("ATLAS_LANGUAGE", "es");
            jail.set_env("ATLAS_CIRCLE_SIZE_MAX", "3.5");

            let args = CliArgs {
                login: Some("alice".into()),
                ..Default::default()
            };
            let config = Config::load(args).expect("valid config");

            assert_eq!(config.verbosity, Verbosity::Verbose);
            assert_eq!(config.language(), Language::Spanish);
            assert_eq!(config.login.as_deref(), Some("alice"));
            assert_eq!(config.limits.note_max_chars, 12);
            assert_eq!(config.limits.circle_size_max, 3.5);

            Ok(())
        });
    }

    #[test]
    fn bad_values_are_reported() {
        Jail::expect_with(|jail| {
            jail.set_env("ATLAS_VERBOSITY", "chatty");

            assert!(Config::load(CliArgs::default()).is_err());

            Ok(())
        });
    }
}
