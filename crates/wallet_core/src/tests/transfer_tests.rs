use std::time::Duration;

use alloy_primitives::U256;
use shared::{chains::SEPOLIA, error::ProviderError};
use tokio::sync::Notify;

use super::*;
use crate::fakes::*;

struct Harness {
    wallet: Arc<FakeWallet>,
    contracts: Arc<FakeContracts>,
    notifier: Arc<RecordingNotifier>,
    session: Arc<WalletSession>,
    orchestrator: TransferOrchestrator,
}

fn build(wallet: Arc<FakeWallet>, contracts: Arc<FakeContracts>, confirm: bool) -> Harness {
    let notifier = RecordingNotifier::answering(confirm);
    let session = WalletSession::new(
        wallet.clone(),
        contracts.clone(),
        notifier.clone(),
        contract_address(),
    );
    let orchestrator = TransferOrchestrator::new(
        Arc::clone(&session),
        wallet.clone(),
        Arc::new(ChainRegistry::default()),
        notifier.clone(),
        SEPOLIA,
    );
    Harness {
        wallet,
        contracts,
        notifier,
        session,
        orchestrator,
    }
}

async fn connected(chain: ChainId, confirm: bool) -> Harness {
    let wallet = FakeWallet::on_chain(chain);
    let contracts = FakeContracts::new(Arc::clone(&wallet));
    let h = build(wallet, contracts, confirm);
    h.session.connect().await.expect("connect");
    h
}

fn half_ether_to_recipient(chain: ChainId) -> TransferRequest {
    TransferRequest::new(
        recipient(),
        EthAmount::parse_positive("0.5").expect("amount"),
        chain,
    )
    .expect("request")
}

fn drain(rx: &mut broadcast::Receiver<TransferPhase>) -> Vec<TransferPhase> {
    let mut phases = Vec::new();
    while let Ok(phase) = rx.try_recv() {
        phases.push(phase);
    }
    phases
}

#[tokio::test]
async fn confirmed_transfer_settles_and_resets_form() {
    let h = connected(ChainId(1), true).await;
    h.orchestrator
        .set_form(TransferForm {
            recipient: format!("{:#x}", recipient()),
            amount: "0.5".into(),
            selected_network: ChainId(1),
            visible: true,
        })
        .await;
    let mut phases = h.orchestrator.subscribe_phases();

    let outcome = h.orchestrator.submit_form().await;

    assert_eq!(
        outcome,
        TransferOutcome::Success {
            amount: EthAmount::parse_positive("0.5").expect("amount"),
            recipient: recipient(),
            tx_hash: B256::repeat_byte(0x11),
        }
    );
    let half = U256::from(500_000_000_000_000_000u64);
    assert_eq!(
        h.contracts.transfers(),
        vec![TransferCall {
            signer: account(),
            recipient: recipient(),
            amount: half,
            value: half,
        }]
    );
    let form = h.orchestrator.form().await;
    assert_eq!(form.recipient, "");
    assert_eq!(form.amount, "0");
    assert_eq!(form.selected_network, ChainId(1));
    assert!(form.visible);
    assert_eq!(
        h.session.snapshot().await.expect("session").balance,
        "1.5000"
    );
    assert!(h
        .session
        .transaction_message()
        .await
        .starts_with("Transaction successful: 0.5 ETH sent to"));
    assert_eq!(
        drain(&mut phases),
        vec![
            TransferPhase::Validating,
            TransferPhase::ConfirmingIntent,
            TransferPhase::Submitting,
            TransferPhase::AwaitingConfirmation {
                tx_hash: B256::repeat_byte(0x11)
            },
            TransferPhase::Settled,
        ]
    );
}

#[tokio::test]
async fn reserved_chain_is_rejected_before_any_prompt_or_call() {
    let h = connected(SEPOLIA, true).await;

    let outcome = h.orchestrator.transfer(half_ether_to_recipient(SEPOLIA)).await;

    assert_eq!(
        outcome,
        TransferOutcome::Rejected {
            reason: RejectReason::TransferDisabledOnChain(SEPOLIA)
        }
    );
    assert!(h.notifier.prompts().is_empty());
    assert!(h.contracts.transfers().is_empty());
    assert!(h.session.transaction_message().await.contains("Sepolia"));
}

#[tokio::test]
async fn network_mismatch_issues_no_contract_call() {
    let h = connected(ChainId(1), true).await;

    let outcome = h.orchestrator.transfer(half_ether_to_recipient(ChainId(137))).await;

    assert_eq!(
        outcome,
        TransferOutcome::Rejected {
            reason: RejectReason::NetworkMismatch(NetworkMismatchError {
                current: ChainId(1),
                requested: ChainId(137),
            })
        }
    );
    assert!(h.contracts.transfers().is_empty());
    assert!(h.notifier.prompts().is_empty());
}

#[tokio::test]
async fn mismatch_check_uses_live_wallet_chain() {
    let h = connected(ChainId(1), true).await;
    // Wallet moved without a notification reaching the session yet.
    h.wallet.with(|state| state.chain_id = ChainId(10));

    let outcome = h.orchestrator.transfer(half_ether_to_recipient(ChainId(1))).await;

    assert!(matches!(
        outcome,
        TransferOutcome::Rejected {
            reason: RejectReason::NetworkMismatch(NetworkMismatchError {
                current: ChainId(10),
                ..
            })
        }
    ));
    assert!(h.contracts.transfers().is_empty());
}

#[tokio::test]
async fn declined_confirmation_issues_no_contract_call() {
    let h = connected(ChainId(1), false).await;

    let outcome = h.orchestrator.transfer(half_ether_to_recipient(ChainId(1))).await;

    assert_eq!(
        outcome,
        TransferOutcome::Rejected {
            reason: RejectReason::UserCancelled
        }
    );
    assert!(h.contracts.transfers().is_empty());
    let prompt = h.notifier.prompts().pop().expect("prompt");
    assert!(prompt.text.contains("0.5 ETH"));
    assert_eq!(prompt.cancel_label.as_deref(), Some("Cancel"));
}

#[tokio::test]
async fn transfer_without_connection_has_no_contract_handle() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let contracts = FakeContracts::new(Arc::clone(&wallet));
    let h = build(wallet, contracts, true);

    let outcome = h.orchestrator.transfer(half_ether_to_recipient(ChainId(1))).await;

    assert_eq!(
        outcome,
        TransferOutcome::Rejected {
            reason: RejectReason::NoContractHandle
        }
    );
    assert!(h.wallet.calls().is_empty());
}

#[tokio::test]
async fn signer_rejection_is_reported_as_failure_and_keeps_balance() {
    let h = connected(ChainId(1), true).await;
    h.contracts.state.lock().expect("lock").submit_error =
        Some(ProviderError::from_code(4001, "User denied transaction signature"));

    let outcome = h.orchestrator.transfer(half_ether_to_recipient(ChainId(1))).await;

    assert!(matches!(outcome, TransferOutcome::Failed { ref cause } if cause.contains("denied")));
    let session = h.session.snapshot().await.expect("session");
    assert_eq!(session.balance, "2.0000");
    assert_eq!(session.account, Some(account()));
    assert_eq!(
        h.session.transaction_message().await,
        "Error during the transfer. Please review the details."
    );
}

#[tokio::test]
async fn reverted_confirmation_is_failure() {
    let h = connected(ChainId(1), true).await;
    h.contracts.state.lock().expect("lock").wait_error =
        Some(ProviderError::from_code(-32000, "execution reverted"));

    let outcome = h.orchestrator.transfer(half_ether_to_recipient(ChainId(1))).await;

    assert!(matches!(outcome, TransferOutcome::Failed { .. }));
    assert_eq!(h.contracts.transfers().len(), 1);
    assert_eq!(h.orchestrator.form().await, TransferForm::default());
}

#[tokio::test]
async fn invalid_form_is_rejected_without_wallet_calls() {
    let h = connected(ChainId(1), true).await;
    let calls_before = h.wallet.calls().len();
    h.orchestrator
        .set_form(TransferForm {
            recipient: "0x1234".into(),
            amount: "0.5".into(),
            ..TransferForm::default()
        })
        .await;

    let outcome = h.orchestrator.submit_form().await;

    assert!(matches!(
        outcome,
        TransferOutcome::Rejected {
            reason: RejectReason::InvalidRequest(_)
        }
    ));
    assert_eq!(h.wallet.calls().len(), calls_before);
}

#[tokio::test]
async fn reconnect_during_pending_confirmation_still_settles() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let gate = Arc::new(Notify::new());
    let contracts = FakeContracts::gated(Arc::clone(&wallet), Arc::clone(&gate));
    let h = Arc::new(build(wallet, contracts, true));
    h.session.connect().await.expect("connect");
    let mut phases = h.orchestrator.subscribe_phases();

    let runner = Arc::clone(&h);
    let transfer = tokio::spawn(async move {
        runner
            .orchestrator
            .transfer(half_ether_to_recipient(ChainId(1)))
            .await
    });

    loop {
        let phase = tokio::time::timeout(Duration::from_secs(2), phases.recv())
            .await
            .expect("timed out")
            .expect("phase");
        if matches!(phase, TransferPhase::AwaitingConfirmation { .. }) {
            break;
        }
    }
    let before = h.session.generation().await;
    h.session.connect().await.expect("reconnect");
    assert!(h.session.generation().await > before);
    gate.notify_one();

    let outcome = transfer.await.expect("join");
    assert!(matches!(outcome, TransferOutcome::Success { .. }));
    assert_eq!(h.session.snapshot().await.expect("session").balance, "1.5000");
}

#[test]
fn request_parsing_validates_every_field() {
    let request = TransferRequest::parse(
        "0x91f1d8111b87a7974a850cff9dfc46ad7f3be76c",
        "0.25",
        "0x1",
    )
    .expect("request");
    assert_eq!(request.target_chain, ChainId(1));
    assert_eq!(request.amount.to_string(), "0.25");

    assert!(matches!(
        TransferRequest::parse("0x91f1", "1", "1"),
        Err(TransferRequestError::Recipient(_))
    ));
    assert!(matches!(
        TransferRequest::parse("0x91f1d8111b87a7974a850cff9dfc46ad7f3be76c", "0", "1"),
        Err(TransferRequestError::Amount(AmountParseError::NotPositive))
    ));
    assert!(matches!(
        TransferRequest::parse("0x91f1d8111b87a7974a850cff9dfc46ad7f3be76c", "1", "main"),
        Err(TransferRequestError::Chain(_))
    ));
    assert!(TransferRequest::new(recipient(), EthAmount::ZERO, ChainId(1)).is_err());
}

#[test]
fn form_toggle_and_reset() {
    let mut form = TransferForm::default();
    form.toggle();
    form.recipient = "0xabc".into();
    form.amount = "3".into();
    form.selected_network = ChainId(137);

    form.reset_fields();

    assert_eq!(
        form,
        TransferForm {
            visible: true,
            ..TransferForm::default()
        }
    );
}
