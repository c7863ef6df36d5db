/// Display helpers for skill cards and award messages.
pub mod formatting;
/// Pure parser helpers.
pub mod parse;
