//! Interactive read-eval-print loop.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::app::{describe_error, App, Outcome};
use crate::cli::ShellLine;

/// What one read from the line editor means for the loop
#[derive(Debug)]
enum Input {
    Line(String),
    Quit,
    Failed(ReadlineError),
}

impl From<Result<String, ReadlineError>> for Input {
    fn from(read: Result<String, ReadlineError>) -> Self {
        match read {
            Ok(line) => Input::Line(line),
            // Ctrl-C and Ctrl-D both leave the shell
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Input::Quit,
            Err(e) => Input::Failed(e),
        }
    }
}

pub async fn run(app: &mut App) -> Result<()> {
    println!("coachline shell. Type `help` for commands, `exit` to leave.");

    loop {
        let line = match Input::from(app.read_line()) {
            Input::Line(line) => line,
            Input::Quit => {
                println!();
                return Ok(());
            }
            Input::Failed(e) => return Err(e).context("Failed to read input"),
        };

        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                eprintln!("error: {}", e);
                continue;
            }
        };
        app.remember(&line);

        let command = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // Help and usage errors print themselves
                let _ = e.print();
                continue;
            }
        };

        match app.run(command).await {
            Ok(Outcome::Exit) => return Ok(()),
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => {
                debug!("Command failed: {:?}", e);
                eprintln!("error: {}", describe_error(&e));
            }
        }
    }
}

pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Rendered(text) => println!("{}", text),
        Outcome::Redirected(target) => println!("redirect: {}", target),
        Outcome::Exit => {}
    }
}

/// Split a line into words, honouring single and double quotes
pub fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
