mod common;

use celo_notes_core::{
    truncate_address, NotesDapp, SessionManager, SessionState, INSTALL_WALLET_MESSAGE,
};
use common::{account, FakeChain, FakeWallet, CONTRACT};
use ethers::utils::to_checksum;

fn dapp_with(wallet: FakeWallet) -> NotesDapp {
    NotesDapp::new(SessionManager::new(wallet.into_provider(), CONTRACT))
}

#[tokio::test]
async fn mount_without_wallet_shows_install_notice() {
    let mut dapp = NotesDapp::new(SessionManager::new(None, CONTRACT));

    let response = dapp.mount().await;

    assert!(!response.ok);
    let snapshot = dapp.snapshot();
    assert_eq!(snapshot.notice.as_deref(), Some(INSTALL_WALLET_MESSAGE));
    assert_eq!(snapshot.state, SessionState::Disconnected);
    assert!(snapshot.address.is_none());
    assert!(snapshot.notes.is_empty());
}

#[tokio::test]
async fn mount_renders_address_balance_and_notes() {
    let chain = FakeChain::new();
    chain.insert("groceries", "milk");
    let mut dapp = dapp_with(FakeWallet::granting(chain, vec![account(0xAB)]));

    let response = dapp.mount().await;
    assert!(response.ok, "{}", response.message);

    let snapshot = dapp.snapshot();
    assert_eq!(snapshot.state, SessionState::Connected);
    let checksummed = to_checksum(&account(0xAB), None);
    assert_eq!(snapshot.address.as_deref(), Some(checksummed.as_str()));
    let short = snapshot.short_address.expect("short address should render");
    assert_eq!(short, truncate_address(&checksummed));
    assert!(short.starts_with("0x"));
    assert!(short.contains("..."));
    assert_eq!(snapshot.balance.as_deref(), Some("2.50 CELO"));
    assert_eq!(snapshot.notes.len(), 1);
    assert_eq!(snapshot.notes[0].title, "groceries");
    assert_eq!(snapshot.notes[0].status, "Active");
}

#[tokio::test]
async fn mount_loads_notes_even_when_balance_fails() {
    let chain = FakeChain::new();
    chain.insert("a", "1");
    let mut wallet = FakeWallet::granting(chain, vec![account(0xAB)]);
    wallet.balance = None;
    let mut dapp = dapp_with(wallet);

    let response = dapp.mount().await;

    assert!(response.ok);
    assert!(response.message.contains("balance unavailable"));
    let snapshot = dapp.snapshot();
    assert!(snapshot.balance.is_none());
    assert_eq!(snapshot.notes.len(), 1);
}

#[tokio::test]
async fn intents_before_mount_are_refused() {
    let chain = FakeChain::new();
    let mut dapp = dapp_with(FakeWallet::granting(chain.clone(), vec![account(0xAB)]));

    assert!(!dapp.add_note("T", "N").await.ok);
    assert!(!dapp.complete_note("1").await.ok);
    assert!(!dapp.delete_note("1").await.ok);
    assert!(!dapp.refresh().await.ok);
    assert_eq!(chain.note_count(), 0);
}

#[tokio::test]
async fn note_intents_round_trip_through_chain() {
    let chain = FakeChain::new();
    let mut dapp = dapp_with(FakeWallet::granting(chain, vec![account(0xAB)]));
    assert!(dapp.mount().await.ok);

    let added = dapp.add_note("T", "N").await;
    assert!(added.ok, "{}", added.message);
    assert!(added.tx_hash.is_some());
    let id = dapp.snapshot().notes[0].id.clone();

    assert!(dapp.complete_note(&id).await.ok);
    assert_eq!(dapp.snapshot().notes[0].status, "Completed");

    assert!(dapp.delete_note(&id).await.ok);
    assert!(dapp.snapshot().notes.is_empty());
}

#[tokio::test]
async fn invalid_note_id_is_rejected_without_submitting() {
    let chain = FakeChain::new();
    let mut dapp = dapp_with(FakeWallet::granting(chain.clone(), vec![account(0xAB)]));
    dapp.mount().await;

    let response = dapp.delete_note("not-a-number").await;

    assert!(!response.ok);
    assert!(response.message.contains("invalid note id"));
    assert!(chain.senders().is_empty());
}

#[tokio::test]
async fn disconnect_clears_rendered_state() {
    let chain = FakeChain::new();
    chain.insert("a", "1");
    let mut dapp = dapp_with(FakeWallet::granting(chain, vec![account(0xAB)]));
    dapp.mount().await;
    assert!(dapp.store().is_some());

    assert!(dapp.disconnect().ok);
    assert!(dapp.store().is_none());
    assert!(!dapp.session().is_connected());

    let snapshot = dapp.snapshot();
    assert_eq!(snapshot.state, SessionState::Disconnected);
    assert!(snapshot.address.is_none());
    assert!(snapshot.balance.is_none());
    assert!(snapshot.notes.is_empty());
}
