use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use khata_core::{ProductId, WebsiteId};
use khata_ledger::Movement;

use crate::StoreError;

/// A movement persisted in the ledger, with its position in the product's
/// stream. Sequence numbers are per (website, product), start at 1, and never
/// change once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMovement {
    pub sequence: u64,
    #[serde(flatten)]
    pub movement: Movement,
}

/// Append-only, website-scoped movement log.
///
/// The log is the audit source for all stock arithmetic. Entries are immutable
/// once appended; the cached `on_hand` counter can always be re-derived by
/// replaying a product's stream in sequence order.
pub trait MovementLog: Send + Sync {
    /// Append one movement to its product's stream.
    fn append(&self, movement: Movement) -> Result<StoredMovement, StoreError>;

    /// Append a batch atomically: either every movement is persisted or none
    /// is. Movements may target different products but must share a website.
    fn append_batch(&self, movements: Vec<Movement>) -> Result<Vec<StoredMovement>, StoreError>;

    /// Most recent movements for a product, newest first, at most `limit`.
    fn list_recent(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<StoredMovement>, StoreError>;

    /// Full stream for a product in sequence order (replay support).
    fn load_stream(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> Result<Vec<StoredMovement>, StoreError>;

    /// All movements for a website, optionally bounded by `recorded_at`.
    fn list_range(
        &self,
        website_id: WebsiteId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<StoredMovement>, StoreError>;
}

impl<L> MovementLog for Arc<L>
where
    L: MovementLog + ?Sized,
{
    fn append(&self, movement: Movement) -> Result<StoredMovement, StoreError> {
        (**self).append(movement)
    }

    fn append_batch(&self, movements: Vec<Movement>) -> Result<Vec<StoredMovement>, StoreError> {
        (**self).append_batch(movements)
    }

    fn list_recent(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<StoredMovement>, StoreError> {
        (**self).list_recent(website_id, product_id, limit)
    }

    fn load_stream(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> Result<Vec<StoredMovement>, StoreError> {
        (**self).load_stream(website_id, product_id)
    }

    fn list_range(
        &self,
        website_id: WebsiteId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<StoredMovement>, StoreError> {
        (**self).list_range(website_id, from, to)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    website_id: WebsiteId,
    product_id: ProductId,
}

/// In-memory append-only movement log.
///
/// Intended for dev/test. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryMovementLog {
    streams: RwLock<HashMap<StreamKey, Vec<StoredMovement>>>,
}

impl InMemoryMovementLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sequence(stream: &[StoredMovement]) -> u64 {
        stream.last().map(|m| m.sequence).unwrap_or(0) + 1
    }
}

impl MovementLog for InMemoryMovementLog {
    fn append(&self, movement: Movement) -> Result<StoredMovement, StoreError> {
        let mut stored = self.append_batch(vec![movement])?;
        stored
            .pop()
            .ok_or_else(|| StoreError::InvalidAppend("empty batch".to_string()))
    }

    fn append_batch(&self, movements: Vec<Movement>) -> Result<Vec<StoredMovement>, StoreError> {
        if movements.is_empty() {
            return Ok(vec![]);
        }

        // All movements in a batch must share a website.
        let website_id = movements[0].website_id;
        for (idx, m) in movements.iter().enumerate() {
            if m.website_id != website_id {
                return Err(StoreError::WebsiteIsolation(format!(
                    "batch contains multiple website_ids (index {idx})"
                )));
            }
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        // Single write lock held for the whole batch: all-or-nothing by
        // construction, nothing below this point can fail.
        let mut committed = Vec::with_capacity(movements.len());
        for movement in movements {
            let key = StreamKey {
                website_id: movement.website_id,
                product_id: movement.product_id,
            };
            let stream = streams.entry(key).or_default();
            let stored = StoredMovement {
                sequence: Self::next_sequence(stream),
                movement,
            };
            stream.push(stored.clone());
            committed.push(stored);
        }

        Ok(committed)
    }

    fn list_recent(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<StoredMovement>, StoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let key = StreamKey { website_id, product_id };
        let mut recent: Vec<StoredMovement> = streams.get(&key).cloned().unwrap_or_default();
        recent.reverse();
        recent.truncate(limit);
        Ok(recent)
    }

    fn load_stream(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> Result<Vec<StoredMovement>, StoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let key = StreamKey { website_id, product_id };
        Ok(streams.get(&key).cloned().unwrap_or_default())
    }

    fn list_range(
        &self,
        website_id: WebsiteId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<StoredMovement>, StoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let mut movements: Vec<StoredMovement> = streams
            .iter()
            .filter(|(k, _)| k.website_id == website_id)
            .flat_map(|(_, stream)| stream.iter().cloned())
            .filter(|m| {
                from.is_none_or(|f| m.movement.recorded_at >= f)
                    && to.is_none_or(|t| m.movement.recorded_at <= t)
            })
            .collect();

        // Deterministic order: product, then stream position.
        movements.sort_by_key(|m| (*m.movement.product_id.as_uuid(), m.sequence));
        Ok(movements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khata_ledger::{MovementDraft, MovementKind};

    fn movement(website_id: WebsiteId, product_id: ProductId, quantity: i64) -> Movement {
        Movement::record(
            website_id,
            product_id,
            MovementDraft::new(MovementKind::In, quantity).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn sequences_are_monotonic_per_product_stream() {
        let log = InMemoryMovementLog::new();
        let website = WebsiteId::new();
        let product_a = ProductId::new();
        let product_b = ProductId::new();

        let a1 = log.append(movement(website, product_a, 1)).unwrap();
        let b1 = log.append(movement(website, product_b, 2)).unwrap();
        let a2 = log.append(movement(website, product_a, 3)).unwrap();

        assert_eq!(a1.sequence, 1);
        assert_eq!(b1.sequence, 1);
        assert_eq!(a2.sequence, 2);
    }

    #[test]
    fn list_recent_is_newest_first_and_bounded() {
        let log = InMemoryMovementLog::new();
        let website = WebsiteId::new();
        let product = ProductId::new();

        for quantity in 1..=5 {
            log.append(movement(website, product, quantity)).unwrap();
        }

        let recent = log.list_recent(website, product, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].sequence, 5);
        assert_eq!(recent[2].sequence, 3);
    }

    #[test]
    fn batch_rejects_mixed_websites_without_appending() {
        let log = InMemoryMovementLog::new();
        let website_a = WebsiteId::new();
        let website_b = WebsiteId::new();
        let product = ProductId::new();

        let err = log
            .append_batch(vec![
                movement(website_a, product, 1),
                movement(website_b, product, 2),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::WebsiteIsolation(_)));

        assert!(log.load_stream(website_a, product).unwrap().is_empty());
        assert!(log.load_stream(website_b, product).unwrap().is_empty());
    }

    #[test]
    fn list_range_filters_by_recorded_at() {
        let log = InMemoryMovementLog::new();
        let website = WebsiteId::new();
        let product = ProductId::new();

        let old = Movement {
            recorded_at: Utc::now() - chrono::Duration::days(10),
            ..movement(website, product, 1)
        };
        log.append(old).unwrap();
        log.append(movement(website, product, 2)).unwrap();

        let cutoff = Utc::now() - chrono::Duration::days(1);
        let in_range = log.list_range(website, Some(cutoff), None).unwrap();
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].movement.quantity, 2);
    }
}
