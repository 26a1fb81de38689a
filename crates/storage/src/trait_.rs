//! Member store trait definition
//!
//! Abstract interface for member persistence

use async_trait::async_trait;
use roster_core::{Member, MemberDraft, MemberId};
use std::sync::Arc;

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid member data: {0}")]
    InvalidData(String),

    #[error("Backend unavailable: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Create/read/update/delete over member records
///
/// Every operation runs off the caller's task and reports failure through
/// its `Result`; nothing is logged-and-dropped.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// All members, ordered by ascending id
    async fn list_all(&self) -> Result<Vec<Member>>;

    /// The member with `id`, if present
    async fn get(&self, id: MemberId) -> Result<Option<Member>>;

    /// Insert a member under a freshly assigned id.
    ///
    /// Id assignment and insert happen as one unit, so concurrent creates
    /// never share an id.
    async fn create(&self, draft: MemberDraft) -> Result<Member>;

    /// Overwrite every mutable field of member `id`.
    ///
    /// Returns `None` and leaves the store untouched when `id` is unknown.
    async fn update(&self, id: MemberId, draft: MemberDraft) -> Result<Option<Member>>;

    /// Remove member `id`; `true` if a record was removed
    async fn delete(&self, id: MemberId) -> Result<bool>;

    /// Remove every member in one batch and report how many were removed
    async fn delete_all(&self) -> Result<u64>;

    /// Number of live members
    async fn count(&self) -> Result<u64>;

    /// Highest live id, `None` when empty
    async fn max_id(&self) -> Result<Option<MemberId>>;
}

/// Shared member store reference
pub type SharedMemberStore = Arc<dyn MemberStore>;
