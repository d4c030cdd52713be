//! Intent classification for the Switchboard router.
//!
//! Maps a raw query (plus a file-presence flag) to a capability label.
//! Stateless between calls; classification failure never aborts a chat turn.

pub mod classifier;
pub mod error;
pub mod model;

pub use classifier::Classifier;
pub use error::ClassifyError;
pub use model::{GeminiIntentModel, IntentModel};
