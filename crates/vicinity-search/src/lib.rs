//! Query interpretation for voice business search.
//!
//! Turns raw utterance text into a structured [`interpreter::ParsedQuery`]
//! (category, service, time window, meal period, location strategy, residual
//! free-text query) and composes it with the search executor in
//! [`engine::process_voice_search`].

pub mod catalog;
pub mod engine;
pub mod interpreter;
pub mod location;
pub mod text;
pub mod time;

pub use catalog::CompiledCatalog;
pub use engine::{process_voice_search, search_request_for, VoiceSearchOutcome};
pub use interpreter::{interpret, interpret_with_location, LocationSource, ParsedQuery};
pub use location::{extract_candidates, resolve_location, LocationCandidate, LocationMatch};
