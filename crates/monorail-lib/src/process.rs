use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use monorail_repository::package_manager::PackageManager;

use crate::engine::{Task, TaskRunner};

/// Command heads treated as successful no-ops without spawning anything.
const IGNORED_COMMANDS: &[&str] = &["echo"];

/// Command heads spawned directly instead of through the package manager.
const DIRECT_COMMANDS: &[&str] = &["mkdir"];

/// Runs a task's command line as OS subprocesses in the package
/// directory, inheriting the parent environment and stdio. Everything
/// that is not a no-op or a direct command is routed through the
/// workspace's package manager runner so package-local binaries resolve.
pub struct CommandRunner {
    package_manager: PackageManager,
}

impl CommandRunner {
    pub fn new(package_manager: PackageManager) -> Self {
        Self { package_manager }
    }

    /// Splits the raw script text on whitespace, then partitions the
    /// tokens on literal `&&` into sub-commands, dropping empty
    /// partitions. Quoted arguments are not interpreted.
    fn sub_commands(command_line: &str) -> Vec<Vec<String>> {
        let tokens: Vec<String> = command_line
            .split_whitespace()
            .map(str::to_string)
            .collect();
        tokens
            .split(|token| token == "&&")
            .filter(|argv| !argv.is_empty())
            .map(|argv| argv.to_vec())
            .collect()
    }

    async fn run_sub_command(&self, argv: &[String], task: &Task) -> anyhow::Result<()> {
        let Some(program) = argv.first() else {
            return Ok(());
        };
        if IGNORED_COMMANDS.contains(&program.as_str()) {
            return Ok(());
        }
        let mut command = if DIRECT_COMMANDS.contains(&program.as_str()) {
            let mut command = Command::new(program);
            command.args(&argv[1..]);
            command
        } else {
            let runner = which::which(self.package_manager.command())
                .with_context(|| format!("{} not found on PATH", self.package_manager))?;
            let mut command = Command::new(runner);
            command.args(argv);
            command
        };
        let status = command
            .current_dir(&task.package_dir)
            .status()
            .await
            .with_context(|| format!("failed to spawn {}", argv.join(" ")))?;
        if !status.success() {
            anyhow::bail!("{} exited with {status}", argv.join(" "));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRunner for CommandRunner {
    async fn run(&self, task: &Task) -> anyhow::Result<()> {
        println!("Starting: {} - {}", task.script, task.package);
        let started = Instant::now();
        let mut outcome = Ok(());
        for argv in Self::sub_commands(&task.command_line) {
            outcome = self.run_sub_command(&argv, task).await;
            if outcome.is_err() {
                break;
            }
        }
        println!(
            "Finished: {} - {} in {:.2} seconds",
            task.script,
            task.package,
            started.elapsed().as_secs_f64()
        );
        outcome
    }
}
