//! The interactive confirmation state machine.
//!
//! Input comes from an injected reader so the whole machine is testable
//! against scripted answers; the orchestrator passes locked stdin.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::diff::{self, DiffConfig};

pub const PROMPT: &str = "Apply these changes? (y/n/a for accept all/q for quit): ";

const RULE_HEAVY: &str =
    "================================================================================";
const RULE_LIGHT: &str =
    "--------------------------------------------------------------------------------";

/// Run-wide review state. `accept_all` is sticky for the rest of the run;
/// `quit` ends the run before any further file is read.
#[derive(Debug, Default)]
pub struct Session {
    pub accept_all: bool,
    pub quit: bool,
}

impl Session {
    pub fn new(accept_all: bool) -> Self {
        Self {
            accept_all,
            quit: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Candidate equals the original; nothing to do.
    NoChange,
    /// Applied without a prompt because `accept_all` was already set.
    AutoApply,
    /// Operator approved this file.
    Apply,
    /// Operator declined this file; the run continues.
    Skip,
    /// Operator ended the run; this file stays unwritten.
    Quit,
}

/// Decides whether `candidate` should replace `original`. No input is
/// consumed on the `NoChange` and `AutoApply` paths; otherwise exactly one
/// line is read. EOF counts as quit.
pub fn review_change(
    session: &mut Session,
    path: &Path,
    original: &str,
    candidate: &str,
    input: &mut dyn BufRead,
    config: &DiffConfig,
) -> Result<ReviewOutcome> {
    if candidate == original {
        println!("no changes needed for {}", path.display());
        return Ok(ReviewOutcome::NoChange);
    }

    if session.accept_all {
        println!("accept-all: applying changes to {}", path.display());
        return Ok(ReviewOutcome::AutoApply);
    }

    println!();
    println!("{RULE_HEAVY}");
    println!("Changes detected for: {}", path.display());
    println!("{RULE_LIGHT}");
    print!("{}", diff::render(original, candidate, config));
    println!("{RULE_LIGHT}");
    print!("{PROMPT}");
    io::stdout().flush().context("flushing prompt")?;

    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .context("reading confirmation input")?;
    if read == 0 {
        println!("input closed; stopping.");
        session.quit = true;
        return Ok(ReviewOutcome::Quit);
    }

    match answer.trim().to_ascii_lowercase().as_str() {
        "y" => Ok(ReviewOutcome::Apply),
        "a" => {
            session.accept_all = true;
            println!("accept-all enabled; remaining files apply without prompts.");
            Ok(ReviewOutcome::Apply)
        }
        "q" => {
            session.quit = true;
            println!("quit requested; stopping.");
            Ok(ReviewOutcome::Quit)
        }
        _ => {
            println!("skipped {}", path.display());
            Ok(ReviewOutcome::Skip)
        }
    }
}
