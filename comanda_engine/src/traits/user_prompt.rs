/// A blocking yes/no question put to the customer before a destructive or irreversible action.
pub trait UserPrompt {
    fn confirm(&self, question: &str) -> bool;
}

/// Answers yes to everything. For scripted, non-interactive use.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl UserPrompt for AssumeYes {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}
