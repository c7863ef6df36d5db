pub mod impls;
pub mod model;
pub mod store;

pub use model::progress::UserProgressDocument;
pub use store::{Document, DocumentPath, DocumentStore, Fields, StoreEvent, Subscription};
