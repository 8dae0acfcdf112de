/// Judges decide each comparison the engine proposes.
///
/// The terminal judge asks a human; the LLM judge asks a chat model.
use anyhow::{Context, Result};
use elorank_core::ItemPayload;
use rand::rngs::StdRng;
use rand::Rng;
use reqwest::Client;
#[cfg(test)]
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

use crate::llm::{compare_pair, LlmConfig};
use crate::output::display_name;
use crate::parse::Verdict;

/// What to do with the active pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    FirstWins,
    SecondWins,
    /// Leave the ratings alone and draw a new pair.
    Skip,
    /// The judge produced no usable answer. Counts as a failed comparison.
    Undecided,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum JudgeKind {
    Terminal,
    Llm,
}

pub enum Judge {
    Terminal(TerminalJudge),
    Llm(LlmJudge),
    /// Replays fixed decisions, then quits.
    #[cfg(test)]
    Scripted(VecDeque<Decision>),
}

impl Judge {
    pub async fn decide(&mut self, first: &ItemPayload, second: &ItemPayload, round: usize) -> Result<Decision> {
        match self {
            Judge::Terminal(judge) => judge.decide(first, second, round),
            Judge::Llm(judge) => judge.decide(first, second).await,
            #[cfg(test)]
            Judge::Scripted(decisions) => Ok(decisions.pop_front().unwrap_or(Decision::Quit)),
        }
    }
}

/// Interactive judge: prints the pair to stderr and reads answers from `input`.
pub struct TerminalJudge {
    input: Box<dyn BufRead>,
}

impl TerminalJudge {
    pub fn new(input: Box<dyn BufRead>) -> Self {
        TerminalJudge { input }
    }

    pub fn stdin() -> Self {
        Self::new(Box::new(std::io::stdin().lock()))
    }

    fn decide(&mut self, first: &ItemPayload, second: &ItemPayload, round: usize) -> Result<Decision> {
        let mut stderr = std::io::stderr();
        writeln!(stderr, "\nComparison {round}")?;
        writeln!(stderr, "  [1] {}", display_name(first))?;
        writeln!(stderr, "  [2] {}", display_name(second))?;

        loop {
            write!(stderr, "Winner (1/2, s = skip, q = quit): ")?;
            stderr.flush()?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).context("Failed to read answer")?;
            if read == 0 {
                return Ok(Decision::Quit);
            }

            match parse_answer(&line) {
                Some(decision) => return Ok(decision),
                None => writeln!(stderr, "Please answer 1, 2, s or q.")?,
            }
        }
    }
}

/// Map a typed answer to a decision. None for anything unrecognized.
pub fn parse_answer(line: &str) -> Option<Decision> {
    match line.trim().to_ascii_lowercase().as_str() {
        "1" | "a" => Some(Decision::FirstWins),
        "2" | "b" => Some(Decision::SecondWins),
        "s" | "skip" => Some(Decision::Skip),
        "q" | "quit" | "exit" => Some(Decision::Quit),
        _ => None,
    }
}

/// Automated judge backed by an OpenAI-compatible chat endpoint.
pub struct LlmJudge {
    pub client: Client,
    pub config: LlmConfig,
    pub template: String,
    pub criterion: String,
    pub max_retries: usize,
    /// Drives the presentation-order coin flip; seeded from --seed.
    pub rng: StdRng,
}

impl LlmJudge {
    /// Present the pair in random order and map the verdict back, so a
    /// model's preference for one position averages out.
    async fn decide(&mut self, first: &ItemPayload, second: &ItemPayload) -> Result<Decision> {
        let swapped = self.presentation_swapped();
        let (option1, option2) = if swapped { (second, first) } else { (first, second) };

        let result = compare_pair(
            &self.client,
            &self.config,
            &self.template,
            &self.criterion,
            &display_name(option1),
            &display_name(option2),
            self.max_retries,
        )
        .await?;

        if result.retries_used > 0 {
            debug!(retries = result.retries_used, "comparison needed retries");
        }

        if result.verdict.is_none() {
            warn!("Unparseable verdict for {} vs {}", first.name, second.name);
            debug!(response = %result.response_text, "unparseable response");
        }
        Ok(verdict_to_decision(result.verdict, swapped))
    }

    fn presentation_swapped(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }
}

fn verdict_to_decision(verdict: Option<Verdict>, swapped: bool) -> Decision {
    match (verdict, swapped) {
        (Some(Verdict::OptionA), false) | (Some(Verdict::OptionB), true) => Decision::FirstWins,
        (Some(Verdict::OptionB), false) | (Some(Verdict::OptionA), true) => Decision::SecondWins,
        (None, _) => Decision::Undecided,
    }
}
