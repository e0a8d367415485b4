use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use log::*;

use crate::traits::UserPrompt;

/// A [`UserPrompt`] that plays back a fixed list of answers and remembers what it was asked.
///
/// Once the answers run out, every further question is answered "no".
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: Arc<Mutex<VecDeque<bool>>>,
    questions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn answering<I: IntoIterator<Item = bool>>(answers: I) -> Self {
        Self { answers: Arc::new(Mutex::new(answers.into_iter().collect())), questions: Arc::default() }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl UserPrompt for ScriptedPrompt {
    fn confirm(&self, question: &str) -> bool {
        self.questions.lock().unwrap_or_else(PoisonError::into_inner).push(question.to_string());
        let answer = self.answers.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        if answer.is_none() {
            warn!("🧪️ No scripted answer for '{question}'. Answering no.");
        }
        answer.unwrap_or(false)
    }
}
