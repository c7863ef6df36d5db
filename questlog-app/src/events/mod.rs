/// Prints notifications from the session slot.
pub mod notifications;
