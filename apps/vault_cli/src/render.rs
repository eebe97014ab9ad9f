use shared::chains::ChainRegistry;
use wallet_core::{
    transfer::{RejectReason, TransferOutcome},
    AppStatus, CommandReport, SessionSnapshot, WalletEvent,
};

pub fn chains(registry: &ChainRegistry) -> String {
    registry
        .iter()
        .map(|info| {
            let testnet = if info.testnet { " (testnet)" } else { "" };
            format!(
                "{:>10}  {}  {}{testnet}",
                info.chain_id, info.name, info.native_currency.symbol
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn session(snapshot: &SessionSnapshot, registry: &ChainRegistry) -> String {
    let account = snapshot
        .account
        .map(|account| format!("{account:#x}"))
        .unwrap_or_else(|| "-".into());
    let symbol = registry
        .get(snapshot.network)
        .map(|info| info.native_currency.symbol.as_str())
        .unwrap_or("ETH");
    format!(
        "account {account} on {} ({}), balance {} {symbol}",
        registry.display_name(snapshot.network),
        snapshot.network,
        snapshot.balance
    )
}

pub fn status(status: &AppStatus) -> String {
    let mut lines = vec![format!(
        "wallet: {}",
        if status.wallet_available {
            "available"
        } else {
            "not detected"
        }
    )];
    match &status.session {
        Some(session) => {
            let account = session
                .account
                .map(|account| format!("{account:#x}"))
                .unwrap_or_else(|| "-".into());
            lines.push(format!("account: {account}"));
            lines.push(format!("balance: {}", session.balance));
            lines.push(format!("network: {} ({})", status.network_name, session.network));
        }
        None => lines.push("account: not connected".into()),
    }
    lines.push(format!("selected network: {}", status.selected_network));
    if !status.transaction_message.is_empty() {
        lines.push(format!("last transaction: {}", status.transaction_message));
    }
    lines.join("\n")
}

fn reject_reason(reason: &RejectReason) -> String {
    match reason {
        RejectReason::NoContractHandle => "no wallet connected".into(),
        RejectReason::TransferDisabledOnChain(chain) => {
            format!("transfers are disabled on chain {chain}")
        }
        RejectReason::NetworkMismatch(mismatch) => format!(
            "wallet is on chain {}, transfer targets chain {}",
            mismatch.current, mismatch.requested
        ),
        RejectReason::UserCancelled => "cancelled".into(),
        RejectReason::InvalidRequest(detail) => format!("invalid request: {detail}"),
    }
}

pub fn report(report: &CommandReport, registry: &ChainRegistry) -> String {
    match report {
        CommandReport::Session(snapshot) => session(snapshot, registry),
        CommandReport::Disconnected => "disconnected".into(),
        CommandReport::Balance(balance) => format!("balance: {balance}"),
        CommandReport::Transfer(TransferOutcome::Success {
            amount,
            recipient,
            tx_hash,
        }) => format!("sent {amount} to {recipient:#x} (tx {tx_hash})"),
        CommandReport::Transfer(TransferOutcome::Rejected { reason }) => {
            format!("transfer rejected: {}", reject_reason(reason))
        }
        CommandReport::Transfer(TransferOutcome::Failed { cause }) => {
            format!("transfer failed: {cause}")
        }
        CommandReport::Form(form) => format!(
            "form: recipient={} amount={} network={}",
            if form.recipient.is_empty() {
                "-"
            } else {
                form.recipient.as_str()
            },
            form.amount,
            form.selected_network
        ),
        CommandReport::FormVisible(true) => "transfer form shown".into(),
        CommandReport::FormVisible(false) => "transfer form hidden".into(),
        CommandReport::Copied => "copied to clipboard".into(),
        CommandReport::Status(app_status) => status(app_status),
    }
}

/// Background event line, if the event is worth printing.
pub fn event(event: &WalletEvent, registry: &ChainRegistry) -> Option<String> {
    match event {
        WalletEvent::ChainChanged(chain) => Some(format!(
            "network changed to {} ({chain})",
            registry.display_name(*chain)
        )),
        WalletEvent::TransactionMessage(message) if !message.is_empty() => {
            Some(message.clone())
        }
        WalletEvent::SessionChanged(None) => Some("session cleared".into()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
