//! Operator confirmation.
//!
//! The batch loop asks two kinds of yes/no question: once before anything
//! runs, and before overwriting an existing RVZ. It asks through
//! [`Confirmer`] so tests can script the answers and unattended runs can
//! answer "yes" up front. The interactive terminal prompt lives in the CLI.

use crate::error::BatchError;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Blocking yes/no question.
pub trait Confirmer {
    /// Ask `prompt`; `Ok(true)` means go ahead.
    fn confirm(&self, prompt: &str) -> Result<bool, BatchError>;
}

/// Answers "yes" to everything (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool, BatchError> {
        Ok(true)
    }
}

/// Replays a fixed list of answers and records every prompt it was shown.
///
/// Once the answers run out it fails with [`BatchError::Prompt`], the same
/// way a terminal prompt fails when stdin closes.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: RefCell<VecDeque<bool>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Every prompt shown so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool, BatchError> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| BatchError::Prompt(format!("no scripted answer for '{prompt}'")))
    }
}
