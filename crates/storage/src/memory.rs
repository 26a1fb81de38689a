//! In-memory member store
//!
//! Keeps members for the lifetime of the process. Used by tests and by the
//! `memory` storage backend.

use async_trait::async_trait;
use roster_core::{Member, MemberDraft, MemberId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::trait_::{MemberStore, Result, SharedMemberStore, StoreError};

#[derive(Debug)]
struct MemoryState {
    members: BTreeMap<MemberId, Member>,
    /// Next id to hand out; only ever grows
    next_id: MemberId,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            members: BTreeMap::new(),
            next_id: MemberId(1),
        }
    }
}

/// In-memory member store
#[derive(Debug, Default)]
pub struct MemoryMemberStore {
    state: Mutex<MemoryState>,
}

impl MemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[async_trait]
impl MemberStore for MemoryMemberStore {
    async fn list_all(&self) -> Result<Vec<Member>> {
        let state = self.lock()?;
        Ok(state.members.values().cloned().collect())
    }

    async fn get(&self, id: MemberId) -> Result<Option<Member>> {
        let state = self.lock()?;
        Ok(state.members.get(&id).cloned())
    }

    async fn create(&self, draft: MemberDraft) -> Result<Member> {
        let mut state = self.lock()?;
        let id = state.next_id;
        state.next_id = id.next();

        let member = Member::from_draft(id, draft);
        state.members.insert(id, member.clone());
        debug!("Created member {}", id);
        Ok(member)
    }

    async fn update(&self, id: MemberId, draft: MemberDraft) -> Result<Option<Member>> {
        let mut state = self.lock()?;
        match state.members.get_mut(&id) {
            Some(member) => {
                member.apply(draft);
                debug!("Updated member {}", id);
                Ok(Some(member.clone()))
            }
            None => {
                debug!("Update skipped, member {} not found", id);
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: MemberId) -> Result<bool> {
        let mut state = self.lock()?;
        Ok(state.members.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut state = self.lock()?;
        let removed = state.members.len() as u64;
        state.members.clear();
        debug!("Deleted {} members", removed);
        Ok(removed)
    }

    async fn count(&self) -> Result<u64> {
        let state = self.lock()?;
        Ok(state.members.len() as u64)
    }

    async fn max_id(&self) -> Result<Option<MemberId>> {
        let state = self.lock()?;
        Ok(state.members.keys().next_back().copied())
    }
}

/// Create a new shared in-memory member store
pub fn create_memory_store() -> SharedMemberStore {
    Arc::new(MemoryMemberStore::new())
}
