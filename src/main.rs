use std::{io, process::ExitCode, sync::Arc};

use atlas_admin::{
    config::{CliArgs, Config},
    console::{Console, Services},
    fixtures::Fixtures,
    lang, logging,
    notifications::NotificationLog,
    session::SessionStore,
};
use clap::Parser;
use log::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Config::load(CliArgs::parse()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Fatal configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = logging::init_logger(config.verbosity, &config.log_file) {
        eprintln!("Failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    debug!("{config:?}");

    let fixtures = match Fixtures::load(&config.fixtures) {
        Ok(fixtures) => fixtures,
        Err(error) => {
            error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let lang = config.language();
    info!(
        "Using language {lang}; available i18n locales: {:?}",
        lang::available_locales()
    );

    let (users, maps) = fixtures.into_directories();

    let identity = Arc::new(SessionStore::default());
    if let Some(username) = &config.login {
        identity.login(username);
    }

    let services = Services {
        users: Arc::new(users),
        maps: Arc::new(maps),
        identity,
        notifications: Arc::new(NotificationLog::default()),
    };

    let mut console = Console::new(services, lang, config.limits);

    match console.run(io::stdin().lock(), io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("Console I/O failed: {error}");
            ExitCode::FAILURE
        }
    }
}
