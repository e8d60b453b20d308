use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "monorail",
    version,
    about = "Run workspace scripts in dependency order"
)]
pub struct Args {
    /// Emit debug-level diagnostics.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a script across the workspace.
    Run {
        /// Script name, as declared in package manifests.
        task: String,

        /// Restrict the run to this package and its prerequisites.
        #[arg(long)]
        to: Option<String>,
    },
}
