use std::io::{self, Write};

use crossterm::style::Stylize;

use crate::error::{AuthError, AuthResult};

/// Interactive input. Everything the user types goes through this so the
/// login flow can run against scripted answers.
pub trait Prompter {
    fn prompt(&self, question: &str) -> AuthResult<String>;

    /// Like `prompt`, without echoing the input
    fn prompt_secret(&self, question: &str) -> AuthResult<String>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&self, question: &str) -> AuthResult<String> {
        print!("{} {}: ", "?".green(), question);
        io::stdout().flush()?;

        let mut buf = String::new();
        let read = io::stdin().read_line(&mut buf)?;

        if read == 0 {
            return Err(AuthError::UserInput(format!("no answer for {}", question)));
        }

        Ok(buf.trim().into())
    }

    fn prompt_secret(&self, question: &str) -> AuthResult<String> {
        let answer = rpassword::prompt_password(format!("{} {}: ", "?".green(), question))?;

        Ok(answer.trim_end_matches(&['\r', '\n'][..]).into())
    }
}
