// CLI module for picksy
// Author: kelexine (https://github.com/kelexine)

use clap::{Parser, Subcommand};

/// picksy - rhythm practice mascot for the terminal
#[derive(Parser, Debug)]
#[command(name = "picksy", version, about, long_about = None)]
pub struct Args {
    /// Config file (defaults to ~/.picksy/config.toml when present)
    #[arg(long, short, env = "PICKSY_CONFIG")]
    pub config: Option<String>,

    /// Answer from keywords only, without contacting any model
    #[arg(long)]
    pub offline: bool,

    /// Print Prometheus metrics on exit
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat with Picksy interactively (default)
    Chat,

    /// Ask a single question and print the reply
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Clear the saved conversation
    Reset,

    /// Tap along to rhythm patterns and get scored
    Practice {
        /// Level to start at
        #[arg(long, short, default_value_t = 1)]
        level: usize,
    },
}

impl Args {
    /// The command to run, `chat` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}
