//! Base types and error handling.
//!
//! Provides foundational types shared by every layer of the widget:
//! - [`ConsentError`](consenterror::ConsentError): recorded failures with stable codes
//! - [`ConsentState`](state::ConsentState): state machine positions and idle reasons

pub mod consenterror;
pub mod context;
pub mod state;
