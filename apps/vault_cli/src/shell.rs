//! Line-oriented front end. Parsed commands go through a bounded queue to a
//! single backend task that owns dispatch, so commands run one at a time.

use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{bail, Result};
use shared::{
    domain::{parse_address, ChainId, ChainIdParseError, EthAmount},
    error::WalletError,
};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use tracing::{debug, warn};
use wallet_core::{transfer::TransferRequest, CommandReport, FormEdit, WalletApp, WalletCommand};

use crate::{console, render};

const HELP: &str = "\
commands:
  connect                     connect the wallet
  disconnect                  forget the session
  status                      print the session
  balance                     refresh the balance
  chains                      list known networks
  switch <chain>              switch the wallet network
  send <to> <amount> [chain]  send funds through the vault
  form                        show or hide the transfer form
  set <to|amount|network> <v> edit a transfer form field
  submit                      send what the form holds
  copy [text]                 copy the vault address (or text)
  help                        this text
  quit                        leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Empty,
    Help,
    Chains,
    Quit,
    Wallet(WalletCommand),
    /// `send` without a chain: resolved against the selector at dispatch time.
    SendOnSelected(TransferRequestDraft),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequestDraft {
    pub recipient: Address,
    pub amount: EthAmount,
}

pub fn parse_line(line: &str) -> Result<ShellInput, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = words.split_first() else {
        return Ok(ShellInput::Empty);
    };

    let command = match (head, rest) {
        ("help" | "?", _) => return Ok(ShellInput::Help),
        ("chains", _) => return Ok(ShellInput::Chains),
        ("quit" | "exit", _) => return Ok(ShellInput::Quit),
        ("connect", []) => WalletCommand::Connect,
        ("disconnect", []) => WalletCommand::Disconnect,
        ("status", []) => WalletCommand::Status,
        ("balance", []) => WalletCommand::RefreshBalance,
        ("form", []) => WalletCommand::ToggleForm,
        ("submit", []) => WalletCommand::SubmitForm,
        ("copy", []) => WalletCommand::CopyAddress,
        ("copy", text) => WalletCommand::CopyText(text.join(" ")),
        ("switch", [chain]) => WalletCommand::SwitchNetwork(parse_chain(chain)?),
        ("send", [to, amount]) => {
            return Ok(ShellInput::SendOnSelected(TransferRequestDraft {
                recipient: parse_address(to).map_err(|err| err.to_string())?,
                amount: EthAmount::parse_positive(amount).map_err(|err| err.to_string())?,
            }))
        }
        ("send", [to, amount, chain]) => WalletCommand::Transfer(
            TransferRequest::parse(to, amount, chain).map_err(|err| err.to_string())?,
        ),
        ("set", [field, value]) => WalletCommand::EditForm(match *field {
            "to" | "recipient" => FormEdit::Recipient((*value).to_string()),
            "amount" => FormEdit::Amount((*value).to_string()),
            "network" | "chain" => FormEdit::Network(parse_chain(value)?),
            other => return Err(format!("unknown form field '{other}'")),
        }),
        (other, _) => return Err(format!("unrecognized command '{other}', try 'help'")),
    };
    Ok(ShellInput::Wallet(command))
}

fn parse_chain(raw: &str) -> Result<ChainId, String> {
    raw.parse().map_err(|err: ChainIdParseError| err.to_string())
}

struct ShellRequest {
    cmd: WalletCommand,
    reply: oneshot::Sender<Result<CommandReport, WalletError>>,
}

/// Queues a command for the backend task. The error text is user facing.
fn queue_command(
    tx: &mpsc::Sender<ShellRequest>,
    cmd: WalletCommand,
) -> Result<oneshot::Receiver<Result<CommandReport, WalletError>>, String> {
    let name = cmd.name();
    let (reply, rx) = oneshot::channel();
    match tx.try_send(ShellRequest { cmd, reply }) {
        Ok(()) => {
            debug!(command = name, "shell: queued command");
            Ok(rx)
        }
        Err(TrySendError::Full(_)) => Err("command queue is full; please retry".into()),
        Err(TrySendError::Closed(_)) => Err("wallet backend stopped".into()),
    }
}

fn spawn_backend(app: Arc<WalletApp>) -> mpsc::Sender<ShellRequest> {
    let (tx, mut rx) = mpsc::channel::<ShellRequest>(16);
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let result = app.dispatch(request.cmd).await;
            let _ = request.reply.send(result);
        }
        debug!("shell: backend task stopped");
    });
    tx
}

fn spawn_event_printer(app: Arc<WalletApp>) {
    let mut events = app.session().subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render::event(&event, app.registry()) {
                        println!("\n* {line}");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "shell: dropped wallet events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

pub async fn run(app: Arc<WalletApp>) -> Result<()> {
    let backend = spawn_backend(Arc::clone(&app));
    spawn_event_printer(Arc::clone(&app));
    println!("{HELP}");

    loop {
        console::prompt("vault> ");
        let Some(line) = console::read_line().await else {
            println!();
            break;
        };

        let cmd = match parse_line(&line) {
            Ok(ShellInput::Empty) => continue,
            Ok(ShellInput::Help) => {
                println!("{HELP}");
                continue;
            }
            Ok(ShellInput::Chains) => {
                println!("{}", render::chains(app.registry()));
                continue;
            }
            Ok(ShellInput::Quit) => break,
            Ok(ShellInput::Wallet(cmd)) => cmd,
            Ok(ShellInput::SendOnSelected(draft)) => {
                let chain = app.network().selected_network().await;
                match TransferRequest::new(draft.recipient, draft.amount, chain) {
                    Ok(request) => WalletCommand::Transfer(request),
                    Err(err) => {
                        println!("error: {err}");
                        continue;
                    }
                }
            }
            Err(err) => {
                println!("error: {err}");
                continue;
            }
        };

        let reply = match queue_command(&backend, cmd) {
            Ok(reply) => reply,
            Err(message) => {
                println!("error: {message}");
                continue;
            }
        };
        match reply.await {
            Ok(Ok(report)) => println!("{}", render::report(&report, app.registry())),
            Ok(Err(err)) => println!("error: {err}"),
            Err(_) => bail!("wallet backend stopped while handling a command"),
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
