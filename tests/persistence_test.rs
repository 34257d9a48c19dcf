#![cfg(feature = "storage-rocksdb")]

use splitpay::application::ledger::PayoutLedger;
use splitpay::domain::order::{OrderId, SellerId};
use splitpay::domain::payout::PayoutStatus;
use splitpay::infrastructure::rocksdb::RocksDbPayoutStore;
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_ledger_state_survives_reopen() {
    let dir = tempdir().unwrap();

    let approved_id = {
        let store = RocksDbPayoutStore::open(dir.path()).unwrap();
        let ledger = PayoutLedger::new(Arc::new(store));

        ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), 8500, 1500)
            .await
            .unwrap();
        ledger
            .create(SellerId::from("s-1"), OrderId::from("o-2"), 3000, 300)
            .await
            .unwrap();

        let released = ledger
            .request_release(&SellerId::from("s-1"), 10000)
            .await
            .unwrap();
        assert_eq!(released.len(), 2);

        ledger.approve(released[0].id).await.unwrap().id
    };

    // Fresh handle over the same directory.
    let store = RocksDbPayoutStore::open(dir.path()).unwrap();
    let ledger = PayoutLedger::new(Arc::new(store));

    let payouts = ledger
        .payouts_for_seller(&SellerId::from("s-1"))
        .await
        .unwrap();
    assert_eq!(payouts.len(), 2);

    // The full dump sees the earlier run's records too.
    let all = ledger.all_payouts().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.windows(2).all(|w| w[0].id > w[1].id));

    let approved = ledger.get(approved_id).await.unwrap().unwrap();
    assert_eq!(approved.status, PayoutStatus::Completed);
    assert!(approved.completed_at.is_some());

    let still_pending: Vec<_> = payouts
        .iter()
        .filter(|p| p.status == PayoutStatus::Pending)
        .collect();
    assert_eq!(still_pending.len(), 1);

    // The unique key holds across restarts: the same notification replayed
    // resolves to the original record.
    let replay = ledger
        .create(SellerId::from("s-1"), OrderId::from("o-1"), 8500, 1500)
        .await
        .unwrap();
    assert_eq!(replay.order_id, OrderId::from("o-1"));
    assert_eq!(
        ledger
            .payouts_for_seller(&SellerId::from("s-1"))
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_reject_reason_persists() {
    let dir = tempdir().unwrap();

    {
        let ledger = PayoutLedger::new(Arc::new(RocksDbPayoutStore::open(dir.path()).unwrap()));
        let payout = ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), 5000, 500)
            .await
            .unwrap();
        ledger
            .request_release(&SellerId::from("s-1"), 0)
            .await
            .unwrap();
        ledger
            .reject(payout.id, "payout account unverified")
            .await
            .unwrap();
    }

    let ledger = PayoutLedger::new(Arc::new(RocksDbPayoutStore::open(dir.path()).unwrap()));
    let payouts = ledger
        .payouts_for_seller(&SellerId::from("s-1"))
        .await
        .unwrap();
    assert_eq!(payouts[0].status, PayoutStatus::Failed);
    assert_eq!(
        payouts[0].failure_reason.as_deref(),
        Some("payout account unverified")
    );
}
