//! Cross-context cookie broker.
//!
//! A sandboxed widget cannot touch the host document. A separately loaded
//! broker with full document access listens on the page bus and answers for
//! it:
//!
//! ```text
//! widget                         page bus                     broker
//!   | -- componentConnected(token, n) -->  | -- ... -->          |
//!   |                                      | <-- documentCookies(token, n, payload)
//!   | <-- ... ------------------------------                     |
//!   | -- deleteCookies([names]) ---------> | -- ... -->  expires under / and /s
//! ```
//!
//! - [`BrokerClient`](client::BrokerClient): widget side, one listener, bounded retry
//! - [`CookieBroker`](host::CookieBroker): host side, payload variant per deployment
//! - [`PageBus`](bus::PageBus): the page-scoped event channel
//! - [`RetryPolicy`](retry::RetryPolicy): 5 retries after the first connect

pub mod bus;
pub mod client;
pub mod event;
pub mod fingerprint;
pub mod host;
pub mod retry;
