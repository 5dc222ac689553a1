//! Saturating reverse polish notation calculator.
//!
//! With no arguments this runs an interactive shell.  Arguments name texttale
//! transcripts to replay and check, one fresh calculator per transcript.

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use rustyline::history::MemHistory;
use rustyline::{Config, Editor};

use texttale::{ExpectTextTale, ShellTextTale, TextTale};

use srpn::{Calculator, DEFAULT_SEED};

#[derive(CommandLine, Debug, Default, PartialEq)]
struct Options {
    #[arrrg(optional, "Seed for the pseudorandom source.", "SEED")]
    seed: Option<u64>,
}

impl Eq for Options {}

fn interpret<T: TextTale>(tale: &mut T, seed: u64) -> std::io::Result<()> {
    let mut calc = Calculator::with_seed(seed);
    while let Some(line) = tale.next_command() {
        calc.process_line(&line, tale)?;
    }
    Ok(())
}

fn main() -> std::io::Result<()> {
    let (options, free) =
        Options::from_command_line_relaxed("Usage: srpn [--seed SEED] [TRANSCRIPT ...]");
    let seed = options.seed.unwrap_or(DEFAULT_SEED);
    if free.is_empty() {
        let config = Config::builder().build();
        let hist = MemHistory::new();
        let rl = Editor::with_history(config, hist).expect("line editor");
        let mut tale = ShellTextTale::new(rl, "> ");
        interpret(&mut tale, seed)
    } else {
        for transcript in free {
            let mut tale = ExpectTextTale::new(transcript, "> ")?;
            interpret(&mut tale, seed)?;
        }
        Ok(())
    }
}
