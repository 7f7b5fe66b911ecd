//! Question answering over condensed content.
//!
//! A [`Session`] opens with exactly two turns: the condensed text as the
//! user's turn and a fixed acknowledgment from the assistant. Follow-up
//! questions are answered by a [`Conversation`] with the session's history
//! in the prompt. Sessions are owned by the caller or kept in a
//! [`SessionStore`] keyed by id; there is no process-wide history.

mod engine;
mod session;
mod store;

pub use engine::Conversation;
pub use session::{Role, Session, Turn};
pub use store::SessionStore;
