//! In-memory implementations of the backend traits, for the terminal client's demo mode and for tests.
mod backend;
#[cfg(any(feature = "test_utils", test))]
mod scripted_prompt;
mod store;

pub use backend::{BackendCall, Endpoint, MemoryBackend};
#[cfg(any(feature = "test_utils", test))]
pub use scripted_prompt::ScriptedPrompt;
pub use store::MemorySelectionStore;
