use std::io::{self, Write};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "botanica";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

fn parse_shell(raw: &str) -> Option<Shell> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        _ => None,
    }
}

pub fn run_completions_command(shell_arg: &str) -> Result<(), AppError> {
    let shell = parse_shell(shell_arg)
        .ok_or_else(|| AppError::InvalidArgument(format!("unknown shell '{shell_arg}'")))?;
    let mut stdout = io::stdout().lock();
    generate_completions(shell, &mut stdout);
    Ok(())
}
