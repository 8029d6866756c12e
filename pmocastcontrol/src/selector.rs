//! Désambiguïsation : d'un ensemble de candidats vers exactement un.
//!
//! Zero candidates fail, one is returned untouched, two or more enter the
//! interactive numbered-choice protocol. Invalid input (empty, non-numeric,
//! out of range) re-prompts instead of failing the pipeline; the retry loop
//! is unbounded by default, with an optional attempt bound for
//! non-interactive callers. Input is consumed line by line, only while a
//! selection is pending.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::debug;

use crate::errors::CastError;
use crate::model::Candidate;

/// Seam between the pipeline and the interactive selection protocol, so the
/// pipeline is testable without a terminal.
#[async_trait]
pub trait CandidateSelector: Send {
    /// Maps a discovery set to exactly one candidate.
    async fn select(&mut self, candidates: Vec<Candidate>) -> Result<Candidate, CastError>;
}

/// Sélecteur interactif à choix numéroté.
pub struct DeviceSelector<R, W> {
    input: R,
    output: W,
    max_attempts: Option<u32>,
}

impl DeviceSelector<BufReader<Stdin>, std::io::Stdout> {
    /// Selector over the process stdin/stdout.
    pub fn console() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout())
    }
}

impl<R, W> DeviceSelector<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            max_attempts: None,
        }
    }

    /// Bounds the retry loop: after `max_attempts` invalid answers the
    /// selection fails instead of re-prompting forever.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    fn render_list(&mut self, candidates: &[Candidate]) -> Result<(), CastError> {
        self.write_list(candidates)
            .map_err(|e| CastError::Selection(e.to_string()))
    }

    fn write_list(&mut self, candidates: &[Candidate]) -> std::io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Please select one AirPlay device:")?;
        for (i, candidate) in candidates.iter().enumerate() {
            writeln!(
                self.output,
                "    {}) {} ({})",
                i + 1,
                candidate.host,
                candidate.name
            )?;
        }
        writeln!(self.output)
    }

    fn render_prompt(&mut self) -> Result<(), CastError> {
        writeln!(
            self.output,
            "Please enter the number corresponding to your selection:"
        )
        .and_then(|_| self.output.flush())
        .map_err(|e| CastError::Selection(e.to_string()))
    }

    async fn prompt_loop(&mut self, mut candidates: Vec<Candidate>) -> Result<Candidate, CastError> {
        self.render_list(&candidates)?;

        let mut attempts = 0u32;
        let mut line = String::new();

        loop {
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    debug!("selection abandoned after {} invalid attempts", attempts);
                    return Err(CastError::NoDeviceSelected);
                }
            }

            self.render_prompt()?;

            line.clear();
            let read = self
                .input
                .read_line(&mut line)
                .await
                .map_err(|e| CastError::Selection(e.to_string()))?;
            if read == 0 {
                // Input stream exhausted: nobody is left to answer.
                return Err(CastError::NoDeviceSelected);
            }

            let text = line.trim();
            if text.is_empty() {
                attempts += 1;
                continue;
            }

            let choice: usize = match text.parse() {
                Ok(n) => n,
                Err(_) => {
                    attempts += 1;
                    continue;
                }
            };

            if choice < 1 || choice > candidates.len() {
                writeln!(
                    self.output,
                    "The number entered is outside the range of valid options."
                )
                .map_err(|e| CastError::Selection(e.to_string()))?;
                attempts += 1;
                continue;
            }

            // Valid selection: stop consuming input immediately.
            return Ok(candidates.remove(choice - 1));
        }
    }
}

#[async_trait]
impl<R, W> CandidateSelector for DeviceSelector<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn select(&mut self, mut candidates: Vec<Candidate>) -> Result<Candidate, CastError> {
        match candidates.len() {
            0 => Err(CastError::NoDeviceSelected),
            1 => Ok(candidates.remove(0)),
            _ => self.prompt_loop(candidates).await,
        }
    }
}
