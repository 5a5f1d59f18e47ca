//! Shell completions for fqcn-converter
//!
//! Provides completion scripts for bash, zsh, fish, powershell and elvish.

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::commands::CommandContext;
use crate::cli::Cli;

const BIN_NAME: &str = "fqcn-converter";

/// Arguments for the completions command
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Print installation instructions instead of the script
    #[arg(long)]
    pub install: bool,
}

impl CompletionsArgs {
    /// Execute the completions command
    pub async fn execute(&self, _ctx: &mut CommandContext) -> anyhow::Result<i32> {
        if self.install {
            print_installation_instructions(self.shell);
        } else {
            generate_completions(self.shell, &mut io::stdout());
        }
        Ok(0)
    }
}

/// Generate shell completions into `out`
pub fn generate_completions(shell: Shell, out: &mut dyn io::Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
}

/// Print installation instructions for completions
pub fn print_installation_instructions(shell: Shell) {
    match shell {
        Shell::Bash => {
            println!("# Add to ~/.bashrc:");
            println!("eval \"$({BIN_NAME} completions bash)\"");
            println!();
            println!("# Or save to file:");
            println!(
                "{BIN_NAME} completions bash > ~/.local/share/bash-completion/completions/{BIN_NAME}"
            );
        }
        Shell::Zsh => {
            println!("# Save into a directory on your fpath:");
            println!("mkdir -p ~/.zsh/completions");
            println!("{BIN_NAME} completions zsh > ~/.zsh/completions/_{BIN_NAME}");
        }
        Shell::Fish => {
            println!("{BIN_NAME} completions fish > ~/.config/fish/completions/{BIN_NAME}.fish");
        }
        Shell::PowerShell => {
            println!("# Add to your PowerShell profile ($PROFILE):");
            println!("Invoke-Expression (& {BIN_NAME} completions powershell | Out-String)");
        }
        Shell::Elvish => {
            println!("# Add to ~/.elvish/rc.elv:");
            println!("eval ({BIN_NAME} completions elvish | slurp)");
        }
        _ => {
            println!("# Unknown shell. Please refer to your shell's documentation for completion installation.");
        }
    }
}
