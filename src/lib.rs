//! # consentnet
//!
//! Visitor identity resolution and cookie consent synchronization for a
//! community site banner.
//!
//! `consentnet` drives a cookie consent widget from page load to a settled
//! state: it resolves a per-visitor identity, verifies it against a remote
//! consent service, then either shows the consent dialog or silently purges
//! the cookies the visitor did not consent to.
//!
//! ## Features
//!
//! - **Two deployment modes**: direct `document.cookie` access, or a sandboxed
//!   widget talking to a host-page broker over page events
//! - **Bounded broker retry**: 6 connect signals at most, correlated answers
//! - **Preview short-circuit**: builder previews touch no cookie, broker or backend
//! - **Idempotent erasure**: every cookie expired under `/` and `/s`
//! - **Preference store**: one entry per authorization form, insertion ordered
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use consentnet::consent::{ConsentWidget, MemoryConsentBackend};
//! use consentnet::cookies::jar::DocumentCookieJar;
//! use consentnet::identity::preview::PageLocation;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), consentnet::base::consenterror::ConsentError> {
//!     let jar = Arc::new(DocumentCookieJar::for_location("https://acme.my.site.com/s/")?);
//!     let mut widget = ConsentWidget::builder()
//!         .location(PageLocation::new("https://acme.my.site.com/s/", "acme.my.site.com"))
//!         .backend(Arc::new(MemoryConsentBackend::default()))
//!         .document_cookies(jar)
//!         .build()?;
//!
//!     println!("settled in {:?}", widget.connect().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Errors, error context and state types
//! - [`broker`] - Page bus, broker client and host-page broker
//! - [`config`] - Widget configuration loaded from JSON
//! - [`consent`] - Sections, preferences, backend and the state machine
//! - [`cookies`] - Document cookie jar and cookie erasure
//! - [`identity`] - Preview detection and identity resolution
//!
//! ## Logging
//!
//! Everything is reported through `tracing`; the library installs no
//! subscriber.

pub mod base;
pub mod broker;
pub mod config;
pub mod consent;
pub mod cookies;
pub mod identity;
