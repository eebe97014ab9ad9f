use std::time::Duration;

use shared::error::ProviderError;
use tokio::sync::Notify;

use super::*;
use crate::fakes::*;

fn session_with(wallet: &Arc<FakeWallet>) -> (Arc<WalletSession>, Arc<FakeContracts>, Arc<RecordingNotifier>) {
    let contracts = FakeContracts::new(Arc::clone(wallet));
    let notifier = RecordingNotifier::answering(true);
    let session = WalletSession::new(
        wallet.clone(),
        contracts.clone(),
        notifier.clone(),
        contract_address(),
    );
    (session, contracts, notifier)
}

async fn next_session_change(rx: &mut broadcast::Receiver<WalletEvent>) -> Option<SessionSnapshot> {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("event");
        if let WalletEvent::SessionChanged(snapshot) = event {
            return snapshot;
        }
    }
}

#[tokio::test]
async fn connect_derives_account_balance_network_and_contract() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, contracts, notifier) = session_with(&wallet);

    let connected = session.connect().await.expect("connect");

    assert_eq!(connected.account, Some(account()));
    assert_eq!(connected.balance, "2.0000");
    assert_eq!(connected.balance_wei, ether(2));
    assert_eq!(connected.network, ChainId(1));
    assert!(connected.signer.is_some());
    assert_eq!(
        connected.contract.as_ref().map(|contract| contract.address()),
        Some(contract_address())
    );
    assert_eq!(contracts.connects(), 1);
    assert!(notifier.informed().is_empty());
}

#[tokio::test]
async fn signer_present_iff_account_present() {
    let wallet = FakeWallet::on_chain(ChainId(137));
    let (session, _, _) = session_with(&wallet);

    assert!(session.session().await.is_none());
    let connected = session.connect().await.expect("connect");
    assert_eq!(connected.signer.is_some(), connected.account.is_some());
    assert_eq!(connected.contract.is_some(), connected.signer.is_some());

    session.disconnect().await;
    assert!(session.session().await.is_none());
}

#[tokio::test]
async fn missing_wallet_fails_without_touching_provider() {
    let wallet = FakeWallet::unavailable();
    let (session, _, notifier) = session_with(&wallet);

    assert!(!session.detect());
    let err = session.connect().await.expect_err("must fail");

    assert_eq!(err, WalletError::WalletUnavailable);
    assert!(wallet.calls().is_empty());
    assert_eq!(notifier.informed().len(), 1);
}

#[tokio::test]
async fn rejected_account_request_keeps_previous_session() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, _, notifier) = session_with(&wallet);
    let first = session.connect().await.expect("connect");

    wallet.with(|state| {
        state.request_accounts_error = Some(ProviderError::from_code(4001, "User rejected"));
        state.chain_id = ChainId(10);
    });
    let err = session.connect().await.expect_err("must fail");

    assert_eq!(err, WalletError::UserRejected);
    let current = session.session().await.expect("session kept");
    assert_eq!(current.network, ChainId(1));
    assert_eq!(current.generation, first.generation);
    assert_eq!(notifier.informed().len(), 1);
}

#[tokio::test]
async fn empty_account_list_resets_session() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, _, _) = session_with(&wallet);
    session.connect().await.expect("connect");

    wallet.with(|state| state.accounts.clear());
    let err = session.connect().await.expect_err("must fail");

    assert_eq!(err, WalletError::AccountUnavailable);
    assert!(session.session().await.is_none());
}

/// Starts a connect that blocks on its balance read. Later calls are not gated.
async fn start_gated_connect(
    wallet: &Arc<FakeWallet>,
    session: &Arc<WalletSession>,
) -> (JoinHandle<Result<Session, WalletError>>, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    wallet.with(|state| state.balance_gate = Some(Arc::clone(&gate)));
    let pending = tokio::spawn({
        let session = Arc::clone(session);
        async move { session.connect().await }
    });
    tokio::time::timeout(Duration::from_secs(2), async {
        while !wallet.calls().contains(&WalletCall::Balance(account())) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("connect never reached the balance read");
    wallet.with(|state| state.balance_gate = None);
    (pending, gate)
}

#[tokio::test]
async fn in_flight_connect_does_not_restore_session_after_account_reset() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, _, _) = session_with(&wallet);
    let (pending, gate) = start_gated_connect(&wallet, &session).await;

    wallet.with(|state| state.accounts.clear());
    let err = session.connect().await.expect_err("must fail");
    assert_eq!(err, WalletError::AccountUnavailable);

    gate.notify_one();
    let stale = pending.await.expect("join").expect_err("stale attempt must fail");

    assert_eq!(stale, WalletError::AccountUnavailable);
    assert!(session.session().await.is_none());
}

#[tokio::test]
async fn in_flight_connect_does_not_outlive_disconnect() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, contracts, _) = session_with(&wallet);
    let (pending, gate) = start_gated_connect(&wallet, &session).await;

    session.disconnect().await;
    gate.notify_one();
    pending.await.expect("join").expect_err("stale attempt must fail");

    assert!(session.session().await.is_none());
    assert_eq!(wallet.chain_listeners(), 0);

    wallet.emit_chain_changed(ChainId(10));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(contracts.connects(), 1);
    assert!(session.session().await.is_none());
}

#[tokio::test]
async fn chain_change_notification_triggers_full_reconnect() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, contracts, _) = session_with(&wallet);
    let first = session.connect().await.expect("connect");
    let mut rx = session.subscribe_events();

    wallet.emit_chain_changed(ChainId(11_155_111));
    let snapshot = next_session_change(&mut rx).await.expect("session");

    assert_eq!(snapshot.network, ChainId(11_155_111));
    assert!(snapshot.generation > first.generation);
    assert_eq!(contracts.connects(), 2);
    let current = session.session().await.expect("session");
    assert_eq!(current.network, wallet.with(|state| state.chain_id));
}

#[tokio::test]
async fn reconnecting_does_not_register_duplicate_listeners() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, contracts, _) = session_with(&wallet);
    session.connect().await.expect("connect");
    session.connect().await.expect("reconnect");
    session.connect().await.expect("reconnect");
    assert_eq!(contracts.connects(), 3);

    let mut rx = session.subscribe_events();
    wallet.emit_chain_changed(ChainId(10));
    next_session_change(&mut rx).await.expect("session");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(contracts.connects(), 4);
}

#[tokio::test]
async fn undecodable_chain_payload_still_resynchronizes() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, _, _) = session_with(&wallet);
    session.connect().await.expect("connect");
    let mut rx = session.subscribe_events();

    wallet.with(|state| state.chain_id = ChainId(8453));
    wallet.emit_raw_chain_changed("not-a-chain");
    let snapshot = next_session_change(&mut rx).await.expect("session");

    assert_eq!(snapshot.network, ChainId(8453));
}

#[tokio::test]
async fn refresh_balance_reads_current_account() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, _, _) = session_with(&wallet);
    assert_eq!(
        session.refresh_balance().await,
        Err(WalletError::AccountUnavailable)
    );

    session.connect().await.expect("connect");
    wallet.with(|state| {
        state
            .balances
            .insert(account(), U256::from(1_500_050_000_000_000_000u64));
    });

    assert_eq!(session.refresh_balance().await.as_deref(), Ok("1.5001"));
    assert_eq!(session.snapshot().await.expect("snapshot").balance, "1.5001");
}

#[tokio::test]
async fn transaction_message_is_broadcast() {
    let wallet = FakeWallet::on_chain(ChainId(1));
    let (session, _, _) = session_with(&wallet);
    let mut rx = session.subscribe_events();

    session.set_transaction_message("pending").await;

    assert_eq!(session.transaction_message().await, "pending");
    assert_eq!(
        rx.recv().await.expect("event"),
        WalletEvent::TransactionMessage("pending".into())
    );
}
