// Roster Storage Layer
//
// Member store interface with pluggable backends

pub mod trait_;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod test_helpers;

pub use trait_::*;
pub use memory::{MemoryMemberStore, create_memory_store};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteMemberStore, create_sqlite_store};

use roster_core::{StorageBackend, StorageConfig};
use std::sync::Arc;
use tracing::info;

/// Open the member store selected by `config`
pub async fn open_member_store(config: &StorageConfig) -> Result<SharedMemberStore> {
    info!("Opening {} member store", config.backend);
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryMemberStore::new())),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite => {
            let store = SqliteMemberStore::open(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite => Err(StoreError::Backend(
            "sqlite backend requires the `sqlite` feature".to_string(),
        )),
    }
}
