use comanda_engine::traits::UserPrompt;
use dialoguer::{theme::ColorfulTheme, Confirm};
use log::warn;

/// Asks the question on the terminal. With `assume_yes` set, nothing is asked and every answer is yes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerPrompt {
    assume_yes: bool,
}

impl DialoguerPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserPrompt for DialoguerPrompt {
    fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            println!("{question} yes");
            return true;
        }
        Confirm::with_theme(&ColorfulTheme::default()).with_prompt(question).default(false).interact().unwrap_or_else(
            |e| {
                warn!("Could not read an answer. Treating it as no. {e}");
                false
            },
        )
    }
}
