//! Roster E2E 测试
//!
//! 通过真实进程调用 CLI，覆盖退出码与输出

use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::TempDir;

// ============== 基础设施 ==============

/// Roster CLI 调用封装
struct RosterCli {
    roster_path: PathBuf,
    workspace: TempDir,
    output_format: Option<String>,
}

struct CliResult {
    success: bool,
    stdout: String,
    stderr: String,
}

impl RosterCli {
    fn new() -> Self {
        Self {
            roster_path: PathBuf::from(env!("CARGO_BIN_EXE_roster")),
            workspace: TempDir::new().expect("temp workspace"),
            output_format: None,
        }
    }

    fn with_output_format(mut self, format: &str) -> Self {
        self.output_format = Some(format.to_string());
        self
    }

    /// 执行命令，所有存储都落在临时目录中
    fn run(&self, args: &[&str]) -> CliResult {
        let root = self.workspace.path();
        let mut cmd = Command::new(&self.roster_path);
        cmd.current_dir(root)
            .env_remove("ROSTER_STORAGE_BACKEND")
            .env_remove("ROSTER_DB_PATH")
            .env_remove("ROSTER_PREFS_PATH")
            .arg("--db")
            .arg(root.join("members.db"))
            .arg("--prefs")
            .arg(root.join("prefs.json"));

        if let Some(format) = &self.output_format {
            cmd.arg("--output").arg(format);
        }

        let output = cmd
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .expect("failed to spawn roster");

        CliResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    fn create_member(&self, name: &str, email: &str) -> CliResult {
        self.run(&[
            "member", "create", "--name", name, "--email", email, "--profession", "Eng",
        ])
    }
}

// ============== 测试用例 ==============

#[test]
fn test_e2e_create_delete_list() {
    let cli = RosterCli::new();

    let first = cli.create_member("Ann", "a@x.com");
    assert!(first.success, "stderr: {}", first.stderr);
    assert!(first.stdout.starts_with("#1 Ann"));

    let second = cli.create_member("Bo", "b@x.com");
    assert!(second.stdout.starts_with("#2 Bo"));

    assert!(cli.run(&["member", "delete", "1"]).success);

    let list = cli.run(&["member", "list"]);
    assert!(list.success);
    assert!(list.stdout.contains("#2 Bo"));
    assert!(!list.stdout.contains("#1 Ann"));
}

#[test]
fn test_e2e_missing_member_exits_nonzero() {
    let cli = RosterCli::new();

    let result = cli.run(&["member", "get", "7"]);
    assert!(!result.success);
    assert!(result.stderr.contains("Not found: member 7"));
}

#[test]
fn test_e2e_json_output() {
    let cli = RosterCli::new().with_output_format("json");
    cli.create_member("Ann", "a@x.com");

    let result = cli.run(&["member", "get", "1"]);
    assert!(result.success);
    assert!(result.stdout.contains("\"id\": 1"));
    assert!(result.stdout.contains("\"email\": \"a@x.com\""));
}

#[test]
fn test_e2e_profile_persists_between_runs() {
    let cli = RosterCli::new();

    assert!(cli.run(&["profile", "set", "--name", "Ann"]).success);
    let show = cli.run(&["profile", "show"]);
    assert!(show.success);
    assert!(show.stdout.contains("Ann"));
}
