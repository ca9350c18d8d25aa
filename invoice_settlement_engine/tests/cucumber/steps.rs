use chrono::Duration;
use cucumber::{given, then, when};
use invoice_settlement_engine::{
    db_types::{InvoiceId, InvoiceStatus, LogType, SettlementStatus},
    traits::AddressTransaction,
    InvoiceManagement,
    WalletError,
};

use crate::{cucumber::SettlementWorld, support::dec};

#[given(expr = "a pending invoice {word} for {word} BCH locked at {word} per BCH")]
async fn pending_invoice(world: &mut SettlementWorld, id: String, coins: String, rate: String) {
    world.system().await.pending_invoice(&id, &coins, &rate).await;
}

#[given(expr = "an invoice {word} for {word} BCH whose price lock at {word} per BCH has lapsed")]
async fn lapsed_invoice(world: &mut SettlementWorld, id: String, coins: String, rate: String) {
    world.system().await.insert_invoice(&id, &coins, &rate, Duration::minutes(-1)).await;
}

#[given(expr = "the wallet sees transaction {word} at the address of invoice {word}")]
async fn wallet_sees_transaction(world: &mut SettlementWorld, tx_hash: String, id: String) {
    let sys = world.sys();
    let invoice = sys.invoice(&id).await;
    sys.wallet.add_transaction(&invoice.receiving_address, AddressTransaction::new(tx_hash));
}

#[given(expr = "the next sweep broadcasts transaction {word}")]
async fn next_sweep_succeeds(world: &mut SettlementWorld, tx_hash: String) {
    world.system().await.wallet.queue_sweep_result(Ok(&tx_hash));
}

#[given(expr = "the next sweep finds no funds")]
async fn next_sweep_finds_nothing(world: &mut SettlementWorld) {
    world.system().await.wallet.queue_sweep_result(Err(WalletError::NoFundsAvailable));
}

#[given(expr = "the oracle quotes {word} per BCH")]
async fn oracle_quotes(world: &mut SettlementWorld, rate: String) {
    world.system().await.oracle.set_rate(dec(&rate));
}

#[given(expr = "the oracle is unavailable")]
async fn oracle_down(world: &mut SettlementWorld) {
    world.system().await.oracle.fail();
}

#[when(expr = "the monitor ticks")]
async fn monitor_ticks(world: &mut SettlementWorld) {
    world.system().await.monitor.tick().await.expect("Tick failed");
}

#[when(expr = "invoice {word} is settled")]
async fn settle_invoice(world: &mut SettlementWorld, id: String) {
    let result = world.system().await.settlement().settle(&InvoiceId::from(id)).await;
    world.last_error = result.err();
}

#[then(expr = "invoice {word} is {word}")]
async fn invoice_status(world: &mut SettlementWorld, id: String, status: String) {
    let expected = status.parse::<InvoiceStatus>().expect("Not a valid status");
    assert_eq!(world.sys().invoice(&id).await.status, expected);
}

#[then(expr = "invoice {word} has settlement hash {word}")]
async fn settlement_hash(world: &mut SettlementWorld, id: String, tx_hash: String) {
    let invoice = world.sys().invoice(&id).await;
    assert_eq!(invoice.settlement_tx_hash, Some(tx_hash));
}

#[then(expr = "invoice {word} is due {word} BCH worth {word} USD")]
async fn amount_due(world: &mut SettlementWorld, id: String, coins: String, fiat: String) {
    let invoice = world.sys().invoice(&id).await;
    assert_eq!(invoice.amount_asset.to_coins(), dec(&coins));
    assert_eq!(invoice.amount_fiat, dec(&fiat));
}

#[then(expr = "invoice {word} has a {word} settlement of {word} USDT")]
async fn has_settlement(world: &mut SettlementWorld, id: String, status: String, amount: String) {
    let settlement = world
        .sys()
        .db
        .fetch_settlement_for_invoice(&InvoiceId::from(id))
        .await
        .expect("Error fetching settlement")
        .expect("There is no settlement");
    assert_eq!(settlement.status, status.parse::<SettlementStatus>().expect("Not a valid settlement status"));
    assert_eq!(settlement.stable_amount, dec(&amount));
    assert_eq!(settlement.currency, "USDT");
}

#[then(expr = "invoice {word} has no settlement")]
async fn has_no_settlement(world: &mut SettlementWorld, id: String) {
    let settlement =
        world.sys().db.fetch_settlement_for_invoice(&InvoiceId::from(id)).await.expect("Error fetching settlement");
    assert!(settlement.is_none(), "Unexpected settlement: {settlement:?}");
}

#[then(expr = "the audit log for invoice {word} has a(n) {word} entry")]
async fn audit_log_entry(world: &mut SettlementWorld, id: String, log_type: String) {
    let expected = log_type.parse::<LogType>().expect("Not a valid log type");
    let logs = world.sys().db.fetch_logs_for_invoice(&InvoiceId::from(id.clone())).await.expect("Error fetching logs");
    let entry = logs.iter().find(|l| l.log_type == expected);
    assert!(entry.is_some(), "No {log_type} entry for {id} in {logs:?}");
    assert_eq!(entry.and_then(|e| e.invoice_id.clone()), Some(InvoiceId::from(id)));
}

#[then(expr = "{int} sweep(s) has/have been broadcast")]
async fn sweeps_broadcast(world: &mut SettlementWorld, count: usize) {
    assert_eq!(world.sys().wallet.broadcast_count(), count);
}

#[then(expr = "the settlement was rejected as not ready")]
async fn rejected(world: &mut SettlementWorld) {
    let err = world.last_error.as_ref().expect("The settlement succeeded");
    assert!(err.is_rejection(), "Unexpected error: {err}");
}
