//! Roster Persistence - 偏好持久化层
//!
//! 轻量的键值偏好存储（JSON 文件）：
//! - 原子写入（临时文件 + rename）
//! - 读缓存
//! - 类型化的个人资料视图 `ProfileDefaults`

pub mod store;
pub mod profile;

pub use store::{PreferenceStore, PreferenceError, Result};
pub use profile::{Profile, ProfileDefaults};
