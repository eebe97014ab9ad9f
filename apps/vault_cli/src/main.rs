use std::{path::PathBuf, sync::Arc};

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eip1193::{Eip1193ContractConnector, HttpTransport, InjectedWallet};
use shared::domain::{parse_address, ChainId, EthAmount};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wallet_core::{
    load_settings, transfer::TransferRequest, WalletApp, WalletCommand, WalletDeps, WalletEvent,
};

mod clipboard;
mod console;
mod render;
mod shell;

use clipboard::SystemClipboard;
use console::TerminalNotifier;

#[derive(Parser, Debug)]
#[command(name = "vault", about = "Send funds through the vault contract from a connected wallet")]
struct Args {
    /// Settings file; `vault.toml` in the working directory when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    rpc_url: Option<String>,
    #[arg(long, global = true, value_parser = parse_address_arg)]
    contract: Option<Address>,
    /// Answer every confirmation prompt with yes.
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and print the session.
    Status,
    /// List the networks the client knows.
    Chains,
    /// Ask the wallet to switch networks, adding the network if needed.
    Switch { chain: ChainId },
    /// Re-read the connected account's balance.
    Balance,
    /// Send funds to a recipient through the vault contract.
    Send {
        #[arg(long, value_parser = parse_address_arg)]
        to: Address,
        #[arg(long)]
        amount: String,
        /// Defaults to the network the wallet is on.
        #[arg(long)]
        chain: Option<ChainId>,
    },
    /// Copy the vault contract address to the clipboard.
    CopyAddress,
    /// Follow network changes until interrupted.
    Watch,
    /// Interactive command loop.
    Shell,
}

fn parse_address_arg(raw: &str) -> Result<Address, String> {
    parse_address(raw).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    if let Some(rpc_url) = args.rpc_url {
        settings.rpc_url = rpc_url;
    }
    if let Some(contract) = args.contract {
        settings.contract_address = contract;
    }

    let transport = Arc::new(HttpTransport::new(&settings.rpc_url)?);
    let chain_poll_interval = settings.chain_poll_interval;
    let receipt_poll_interval = settings.receipt_poll_interval;
    let app = Arc::new(WalletApp::new(
        settings,
        WalletDeps {
            provider: Arc::new(InjectedWallet::new(Arc::clone(&transport))),
            contracts: Arc::new(Eip1193ContractConnector::new(
                Arc::clone(&transport),
                receipt_poll_interval,
            )),
            notifier: Arc::new(TerminalNotifier::new(args.yes)),
            clipboard: Arc::new(SystemClipboard),
        },
    ));
    app.session().detect();

    match args.command.unwrap_or(Command::Shell) {
        Command::Chains => println!("{}", render::chains(app.registry())),
        Command::Status => {
            if let Err(err) = app.dispatch(WalletCommand::Connect).await {
                warn!("status: not connected: {err}");
            }
            println!("{}", render::status(&app.status().await));
        }
        Command::Switch { chain } => {
            app.dispatch(WalletCommand::Connect).await?;
            let report = app.dispatch(WalletCommand::SwitchNetwork(chain)).await?;
            println!("{}", render::report(&report, app.registry()));
        }
        Command::Balance => {
            app.dispatch(WalletCommand::Connect).await?;
            let report = app.dispatch(WalletCommand::RefreshBalance).await?;
            println!("{}", render::report(&report, app.registry()));
        }
        Command::Send { to, amount, chain } => {
            app.dispatch(WalletCommand::Connect).await?;
            let amount = EthAmount::parse_positive(&amount)?;
            let chain = match chain {
                Some(chain) => chain,
                None => app.network().selected_network().await,
            };
            let request = TransferRequest::new(to, amount, chain)?;
            let report = app.dispatch(WalletCommand::Transfer(request)).await?;
            println!("{}", render::report(&report, app.registry()));
        }
        Command::CopyAddress => {
            let report = app.dispatch(WalletCommand::CopyAddress).await?;
            println!("{}", render::report(&report, app.registry()));
        }
        Command::Watch => {
            transport.watch_chain(chain_poll_interval).await;
            let mut events = app.session().subscribe_events();
            let report = app.dispatch(WalletCommand::Connect).await?;
            println!("{}", render::report(&report, app.registry()));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(WalletEvent::SessionChanged(Some(snapshot))) => {
                            println!("{}", render::session(&snapshot, app.registry()));
                        }
                        Ok(event) => {
                            if let Some(line) = render::event(&event, app.registry()) {
                                println!("{line}");
                            }
                        }
                        Err(err) => warn!("watch: event stream interrupted: {err}"),
                    },
                }
            }
            transport.stop_watching().await;
        }
        Command::Shell => {
            transport.watch_chain(chain_poll_interval).await;
            shell::run(Arc::clone(&app)).await?;
            transport.stop_watching().await;
        }
    }

    Ok(())
}
