//! The consent banner: remote sections, visitor preferences and the state
//! machine tying identity, backend and cookie erasure together.
//!
//! - [`backend`]: remote consent service trait and in-memory service
//! - [`navigator`]: history and link side effects
//! - [`preferences`]: deduplicated per-form preferences
//! - [`section`]: consent sections and their view state
//! - [`widget`]: the state machine

pub mod backend;
pub mod navigator;
pub mod preferences;
pub mod section;
pub mod widget;

pub use backend::{BackendOperation, ConsentBackend, MemoryConsentBackend};
pub use widget::{ConsentWidget, ConsentWidgetBuilder};
