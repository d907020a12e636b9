//! Host document cookies and their invalidation.
//!
//! This module provides everything the widget and the host broker need to
//! touch cookies:
//!
//! - **Storage**: the host document's jar ([`DocumentCookieJar`](jar::DocumentCookieJar))
//! - **Capabilities**: direct or relayed mutation ([`CookieAccess`](access::CookieAccess))
//! - **Erasure**: two-path invalidation of disallowed cookies ([`CookieEraser`](eraser::CookieEraser))
//!
//! # Architecture
//!
//! | Browser concept | consentnet (Rust) | Responsibility |
//! |-----------------|-------------------|----------------|
//! | `document.cookie` | [`DocumentCookieJar`](jar::DocumentCookieJar) | Read string, write line |
//! | cookie record | [`DocumentCookie`](canonical_cookie::DocumentCookie) | Single cookie |
//! | `deleteCookies` listener | [`DirectCookieAccess`](access::DirectCookieAccess) | Expiry writes |
//! | `deleteCookies` dispatch | [`RelayedCookieAccess`](access::RelayedCookieAccess) | Page bus signal |
//!
//! # Erasing cookies
//!
//! ```rust
//! use consentnet::cookies::access::DirectCookieAccess;
//! use consentnet::cookies::eraser::CookieEraser;
//! use consentnet::cookies::jar::DocumentCookieJar;
//! use std::sync::Arc;
//!
//! let jar = Arc::new(DocumentCookieJar::for_location("https://example.com/s/")?);
//! jar.write("_ga=GA1.2.3; Path=/")?;
//!
//! let eraser = CookieEraser::new(Arc::new(DirectCookieAccess::new(jar.clone())));
//! eraser.erase(&["_ga".to_string()])?;
//! assert_eq!(jar.get("_ga"), None);
//! # Ok::<(), consentnet::base::consenterror::ConsentError>(())
//! ```

pub mod access;
pub mod canonical_cookie;
pub mod eraser;
pub mod jar;
