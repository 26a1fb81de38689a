// Roster Core - 核心数据模型
//!
//! 包含：
//! - Member: 成员记录与输入草稿
//! - Config: 存储与偏好配置

mod member;
mod config;

pub use member::*;
pub use config::*;
