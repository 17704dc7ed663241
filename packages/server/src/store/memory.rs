use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Ownership, OwnershipRecord, OwnershipStore, StoreError};

struct Row {
    /// Insertion order, stands in for the database's creation ordering.
    seq: u64,
    record: OwnershipRecord,
}

/// In-process ownership store with the same row semantics as the
/// database store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryOwnershipStore {
    rows: DashMap<(String, String), Row>,
    next_seq: AtomicU64,
}

impl MemoryOwnershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnershipStore for MemoryOwnershipStore {
    async fn upsert_active(
        &self,
        identity: &str,
        content_id: &str,
        label: &str,
        byte_size: i64,
    ) -> Result<u64, StoreError> {
        match self
            .rows
            .entry((identity.to_string(), content_id.to_string()))
        {
            Entry::Occupied(mut entry) => {
                let record = &mut entry.get_mut().record;
                record.label = label.to_string();
                record.byte_size = byte_size;
                record.removed_at = None;
            }
            Entry::Vacant(entry) => {
                entry.insert(Row {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    record: OwnershipRecord {
                        identity: identity.to_string(),
                        content_id: content_id.to_string(),
                        label: label.to_string(),
                        byte_size,
                        created_at: Utc::now(),
                        removed_at: None,
                    },
                });
            }
        }
        Ok(1)
    }

    async fn list_active_by_identity(&self, identity: &str) -> Result<Vec<String>, StoreError> {
        let mut active: Vec<(u64, String)> = self
            .rows
            .iter()
            .filter(|row| row.record.identity == identity && row.record.is_active())
            .map(|row| (row.seq, row.record.content_id.clone()))
            .collect();
        active.sort_unstable_by_key(|(seq, _)| *seq);
        Ok(active.into_iter().map(|(_, id)| id).collect())
    }

    async fn list_active_by_content_ids(
        &self,
        content_ids: &[String],
    ) -> Result<Vec<Ownership>, StoreError> {
        let wanted: HashSet<&str> = content_ids.iter().map(String::as_str).collect();
        Ok(self
            .rows
            .iter()
            .filter(|row| {
                row.record.is_active() && wanted.contains(row.record.content_id.as_str())
            })
            .map(|row| Ownership {
                identity: row.record.identity.clone(),
                content_id: row.record.content_id.clone(),
            })
            .collect())
    }

    async fn deactivate(&self, identity: &str, content_ids: &[String]) -> Result<u64, StoreError> {
        let now = Utc::now();
        let unique: HashSet<&String> = content_ids.iter().collect();
        let mut marked = 0;
        for content_id in unique {
            let key = (identity.to_string(), content_id.clone());
            if let Some(mut row) = self.rows.get_mut(&key)
                && row.record.removed_at.is_none()
            {
                row.record.removed_at = Some(now);
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn list_all(&self) -> Result<Vec<OwnershipRecord>, StoreError> {
        let mut all: Vec<(u64, OwnershipRecord)> = self
            .rows
            .iter()
            .map(|row| (row.seq, row.record.clone()))
            .collect();
        all.sort_unstable_by_key(|(seq, _)| *seq);
        Ok(all.into_iter().map(|(_, record)| record).collect())
    }
}
