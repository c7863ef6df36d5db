mod events;

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use questlog_commands::{Reply, dispatch, sync::load_or_initialize};
use questlog_core::{AppConfig, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    let config = AppConfig::from_env();
    info!(
        app_id = %config.app_id,
        local_only = config.is_local_only(),
        "Starting questlog."
    );

    let session = Session::connect(&config).await;
    events::notifications::print_current(&session);
    let _printer = events::notifications::spawn_printer(&session);

    // Keep the subscription alive for the whole run.
    let _sync = load_or_initialize(&session).await;

    println!("Type `help` for commands, `status` for your skills.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match dispatch(&session, &line).await {
            Reply::Quit => break,
            Reply::Lines(output) => {
                for text in output {
                    println!("{text}");
                }
            }
        }
    }

    info!("Goodbye.");
    Ok(())
}
