use clap::Parser;
use cli::Cli;
use ipblock::blacklist::{self, Reaper};
use ipblock::gate::{DenyMessage, Guard};
use log::{info, warn, LevelFilter};
use tokio::sync::watch;

mod cli;
mod http;
mod logger;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initiate logger
    let level = match cli.debug {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::max(),
    };
    logger::setup(cli.log.as_deref(), level)?;

    // Seed the blacklist with the startup bans
    let blacklist = blacklist::global();
    for ban in &cli.bans {
        blacklist.add(&ban.ip, ban.duration_secs())?;
    }
    let now = blacklist.now();
    for entry in blacklist.snapshot() {
        info!(
            "Blocking {}, {}",
            entry,
            utils::datetime::format_expiry(&entry, now)
        );
    }

    let reaper = Reaper::spawn(blacklist.clone(), cli.reap_interval);

    let guard = Guard::new(blacklist, http::Welcome).with_responder(DenyMessage::new(cli.message));
    let server =
        http::HttpServer::bind((cli.bind.as_str(), cli.port), guard, cli.trust_proxy).await?;

    // Stop accepting connections on Ctrl-C
    let (exit_tx, exit_rx) = watch::channel(());
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                let _ = exit_tx.send(());
            }
            Err(err) => {
                warn!("Unable to listen for Ctrl-C: {}", err);
                // keep the sender alive, the server runs until killed
                std::future::pending::<()>().await;
            }
        }
    });

    let result = server.run(exit_rx).await;
    reaper.shutdown().await;
    result
}
