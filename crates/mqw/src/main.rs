use std::{process::ExitCode, sync::Arc};

use tracing::error;

use mqw_core::{
    checker::NotificationChecker,
    config::Config,
    messaging::{disabled::DisabledMessenger, port::MessagingPort},
};
use mqw_mostaql::MostaqlClient;
use mqw_telegram::TelegramMessenger;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = mqw_core::logging::init("mqw") {
        eprintln!("{e}");
    }

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// One check per process; scheduling is left to cron / CI.
async fn run() -> Result<u8, mqw_core::Error> {
    let cfg = Config::load()?;

    let source = Arc::new(MostaqlClient::from_config(&cfg)?);
    let messenger: Arc<dyn MessagingPort> = match &cfg.telegram {
        Some(tg) => Arc::new(TelegramMessenger::from_settings(tg)?),
        None => Arc::new(DisabledMessenger),
    };

    let checker = NotificationChecker::new(source, messenger, cfg.dashboard_url.clone());
    let outcome = checker.check_once().await;
    Ok(outcome.exit_code())
}
