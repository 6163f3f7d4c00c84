use std::io::{BufRead, Write};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::interrupt::Interrupt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Ctrl-C, or no more input to read.
    Interrupted,
}

/// Asks the operator before every tracker change.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> Answer;
}

/// Accepts everything until Ctrl-C; used with `--yes`.
pub struct AssumeYes {
    interrupt: Interrupt,
}

impl AssumeYes {
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }
}

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, prompt: &str) -> Answer {
        if self.interrupt.is_raised() {
            return Answer::Interrupted;
        }
        println!("{prompt} [y/n] (n): y");
        Answer::Yes
    }
}

/// `y/n` prompt on the terminal.
///
/// Stdin is read line by line on a dedicated thread; an interrupted prompt
/// leaves no pending read behind.
pub struct TerminalConfirm {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
    interrupt: Interrupt,
}

impl TerminalConfirm {
    pub fn new(interrupt: Interrupt) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            lines: Mutex::new(rx),
            interrupt,
        }
    }
}

fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "" | "n" | "no" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> Answer {
        if self.interrupt.is_raised() {
            return Answer::Interrupted;
        }
        let mut lines = self.lines.lock().await;
        loop {
            print!("{prompt} [y/n] (n): ");
            let _ = std::io::stdout().flush();

            let line = tokio::select! {
                line = lines.recv() => line,
                _ = self.interrupt.raised() => None,
            };
            let Some(line) = line else {
                println!();
                return Answer::Interrupted;
            };
            match parse_answer(&line) {
                Some(true) => return Answer::Yes,
                Some(false) => return Answer::No,
                None => println!("Please enter Y or N"),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_accepts_yes_and_no() {
        assert_eq!(parse_answer("y"), Some(true));
        assert_eq!(parse_answer(" YES \n"), Some(true));
        assert_eq!(parse_answer("n"), Some(false));
        assert_eq!(parse_answer(""), Some(false));
        assert_eq!(parse_answer("maybe"), None);
    }

    #[tokio::test]
    async fn assume_yes_confirms_until_interrupted() {
        let interrupt = Interrupt::default();
        let confirm = AssumeYes::new(interrupt.clone());
        assert_eq!(confirm.confirm("Create issue?").await, Answer::Yes);
        interrupt.raise();
        assert_eq!(confirm.confirm("Create issue?").await, Answer::Interrupted);
    }

    #[tokio::test]
    async fn terminal_confirm_is_interrupted_once_raised() {
        let interrupt = Interrupt::default();
        interrupt.raise();
        let confirm = TerminalConfirm::new(interrupt);
        assert_eq!(confirm.confirm("Create issue?").await, Answer::Interrupted);
    }
}
