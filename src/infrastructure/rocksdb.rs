use crate::domain::order::{OrderId, SellerId};
use crate::domain::payout::{NewPayout, Payout, PayoutId, PayoutStatus};
use crate::domain::ports::{InsertOutcome, PayoutStore, ReleaseOutcome, UpdateOutcome};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family holding payout records keyed by id.
pub const CF_PAYOUTS: &str = "payouts";
/// Column family acting as the unique index on (order_id, seller_id).
pub const CF_PAYOUT_KEYS: &str = "payout_keys";
/// Column family for the id counter.
pub const CF_META: &str = "meta";

const META_NEXT_ID: &[u8] = b"next_id";
/// Separator between order id and seller id in index keys. Not a legal
/// character in either identifier.
const KEY_SEP: u8 = 0;

/// A persistent payout store backed by RocksDB.
///
/// RocksDB has no native unique constraint, so writers are serialized
/// through an internal mutex: the index probe and the batched write of
/// record plus index entry form one critical section. Readers go straight
/// to the column families. `Clone` shares the underlying database.
#[derive(Clone)]
pub struct RocksDbPayoutStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn natural_key(order_id: &OrderId, seller_id: &SellerId) -> Vec<u8> {
    let mut key = Vec::with_capacity(order_id.0.len() + seller_id.0.len() + 1);
    key.extend_from_slice(order_id.0.as_bytes());
    key.push(KEY_SEP);
    key.extend_from_slice(seller_id.0.as_bytes());
    key
}

fn order_prefix(order_id: &OrderId) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(order_id.0.len() + 1);
    prefix.extend_from_slice(order_id.0.as_bytes());
    prefix.push(KEY_SEP);
    prefix
}

impl RocksDbPayoutStore {
    /// Opens or creates the database at `path`, ensuring all column
    /// families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_PAYOUTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_PAYOUT_KEYS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PayoutError::Internal(format!("Column family {name} not found")))
    }

    fn encode(payout: &Payout) -> Result<Vec<u8>> {
        serde_json::to_vec(payout)
            .map_err(|e| PayoutError::Internal(format!("Failed to serialize payout: {e}")))
    }

    fn decode(bytes: &[u8]) -> Result<Payout> {
        serde_json::from_slice(bytes)
            .map_err(|e| PayoutError::Internal(format!("Failed to deserialize payout: {e}")))
    }

    fn next_id(&self) -> Result<PayoutId> {
        let cf = self.cf(CF_META)?;
        let current = match self.db.get_cf(cf, META_NEXT_ID)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    PayoutError::Internal("Corrupt id counter in meta column family".to_string())
                })?;
                u64::from_be_bytes(bytes)
            }
            None => 0,
        };
        let next = current + 1;
        self.db.put_cf(cf, META_NEXT_ID, next.to_be_bytes())?;
        Ok(PayoutId(next))
    }

    fn scan_payouts(&self) -> Result<Vec<Payout>> {
        let cf = self.cf(CF_PAYOUTS)?;
        let mut payouts = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| PayoutError::Internal(format!("Iteration error: {e}")))?;
            payouts.push(Self::decode(&value)?);
        }
        Ok(payouts)
    }

    fn put_payout(&self, batch: &mut WriteBatch, payout: &Payout) -> Result<()> {
        let cf = self.cf(CF_PAYOUTS)?;
        batch.put_cf(cf, payout.id.0.to_be_bytes(), Self::encode(payout)?);
        Ok(())
    }
}

#[async_trait]
impl PayoutStore for RocksDbPayoutStore {
    async fn insert(&self, new: NewPayout) -> Result<InsertOutcome> {
        let _guard = self.write_lock.lock().await;

        let keys_cf = self.cf(CF_PAYOUT_KEYS)?;
        let key = natural_key(&new.order_id, &new.seller_id);
        if self.db.get_pinned_cf(keys_cf, &key)?.is_some() {
            return Ok(InsertOutcome::Duplicate);
        }

        let id = self.next_id()?;
        let payout = Payout::new(id, new, Utc::now());

        let mut batch = WriteBatch::default();
        batch.put_cf(keys_cf, &key, id.0.to_be_bytes());
        self.put_payout(&mut batch, &payout)?;
        self.db.write(batch)?;

        Ok(InsertOutcome::Created(payout))
    }

    async fn get(&self, id: PayoutId) -> Result<Option<Payout>> {
        let cf = self.cf(CF_PAYOUTS)?;
        match self.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_by_key(
        &self,
        order_id: &OrderId,
        seller_id: &SellerId,
    ) -> Result<Option<Payout>> {
        let keys_cf = self.cf(CF_PAYOUT_KEYS)?;
        let Some(id_bytes) = self.db.get_cf(keys_cf, natural_key(order_id, seller_id))? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = id_bytes.as_slice().try_into().map_err(|_| {
            PayoutError::Internal("Corrupt id in payout key index".to_string())
        })?;
        self.get(PayoutId(u64::from_be_bytes(bytes))).await
    }

    async fn list_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Payout>> {
        let mut payouts: Vec<Payout> = self
            .scan_payouts()?
            .into_iter()
            .filter(|p| &p.seller_id == seller_id)
            .collect();
        payouts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(payouts)
    }

    async fn list_all(&self) -> Result<Vec<Payout>> {
        let mut payouts = self.scan_payouts()?;
        payouts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(payouts)
    }

    async fn exists_for_order(&self, order_id: &OrderId) -> Result<bool> {
        let keys_cf = self.cf(CF_PAYOUT_KEYS)?;
        let prefix = order_prefix(order_id);
        let mut iter = self.db.iterator_cf(
            keys_cf,
            rocksdb::IteratorMode::From(prefix.as_slice(), rocksdb::Direction::Forward),
        );
        match iter.next() {
            Some(item) => {
                let (key, _value) =
                    item.map_err(|e| PayoutError::Internal(format!("Iteration error: {e}")))?;
                Ok(key.starts_with(&prefix))
            }
            None => Ok(false),
        }
    }

    async fn pending_total(&self, seller_id: &SellerId) -> Result<i64> {
        Ok(self
            .scan_payouts()?
            .into_iter()
            .filter(|p| {
                &p.seller_id == seller_id
                    && matches!(p.status, PayoutStatus::Hold | PayoutStatus::Pending)
            })
            .map(|p| p.amount.value())
            .sum())
    }

    async fn list_in_review(&self) -> Result<Vec<Payout>> {
        let mut payouts: Vec<Payout> = self
            .scan_payouts()?
            .into_iter()
            .filter(|p| p.status.is_reviewable())
            .collect();
        payouts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(payouts)
    }

    async fn release_held(
        &self,
        seller_id: &SellerId,
        minimum: i64,
        now: DateTime<Utc>,
    ) -> Result<ReleaseOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut held: Vec<Payout> = self
            .scan_payouts()?
            .into_iter()
            .filter(|p| &p.seller_id == seller_id && p.status == PayoutStatus::Hold)
            .collect();
        if held.is_empty() {
            return Ok(ReleaseOutcome::NothingHeld);
        }

        let held_total: i64 = held.iter().map(|p| p.amount.value()).sum();
        if held_total < minimum {
            return Ok(ReleaseOutcome::BelowThreshold { held_total });
        }

        let mut batch = WriteBatch::default();
        for payout in &mut held {
            payout.release(now)?;
            self.put_payout(&mut batch, payout)?;
        }
        self.db.write(batch)?;

        held.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(ReleaseOutcome::Released(held))
    }

    async fn update(&self, payout: Payout, expected: PayoutStatus) -> Result<UpdateOutcome> {
        let _guard = self.write_lock.lock().await;

        let Some(current) = self.get(payout.id).await? else {
            return Ok(UpdateOutcome::Missing);
        };
        if current.status != expected {
            return Ok(UpdateOutcome::StatusChanged(current));
        }

        let mut batch = WriteBatch::default();
        self.put_payout(&mut batch, &payout)?;
        self.db.write(batch)?;
        Ok(UpdateOutcome::Updated(payout))
    }
}
