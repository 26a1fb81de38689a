//! Roster Interface - 交互层
//!
//! 职责：
//! - CLI 命令行工具（成员记录 + 个人资料偏好）

pub mod cli;


pub use cli::{AppContext, Cli, CliError, OutputFormat, execute, run_cli};
