//! Capability-scoped cookie mutation.
//!
//! The widget never branches on deployment mode when it needs cookies gone:
//! it is handed one [`CookieAccess`] at construction and calls it.
//!
//! | Transport | Used in | Mutation |
//! |-----------|---------|----------|
//! | [`DirectCookieAccess`] | direct mode, host broker | writes expiry lines into the document jar |
//! | [`RelayedCookieAccess`] | sandboxed mode | emits `deleteCookies` on the page bus |

use crate::base::consenterror::ConsentError;
use crate::broker::bus::PageBus;
use crate::broker::event::PageEvent;
use crate::cookies::canonical_cookie::expiry_line;
use crate::cookies::jar::DocumentCookieJar;
use std::fmt;
use std::sync::Arc;

/// Paths every erased cookie is invalidated under: the site root and the
/// community path.
pub const DEFAULT_ERASE_PATHS: [&str; 2] = ["/", "/s"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieTransport {
    Direct,
    Relayed,
}

impl fmt::Display for CookieTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieTransport::Direct => f.write_str("direct"),
            CookieTransport::Relayed => f.write_str("relayed"),
        }
    }
}

/// Trait for invalidating cookies.
///
/// Implementations must be idempotent: expiring a cookie that does not exist
/// is a no-op, not an error.
pub trait CookieAccess: Send + Sync {
    /// Invalidate every named cookie. Returns the number of expiry
    /// mutations performed locally (zero when relayed).
    fn expire(&self, names: &[String]) -> Result<usize, ConsentError>;

    fn transport(&self) -> CookieTransport;
}

/// Blanket implementation for Arc-wrapped accessors.
impl<A: CookieAccess + ?Sized> CookieAccess for Arc<A> {
    fn expire(&self, names: &[String]) -> Result<usize, ConsentError> {
        (**self).expire(names)
    }

    fn transport(&self) -> CookieTransport {
        (**self).transport()
    }
}

/// Mutates the document cookie jar directly.
pub struct DirectCookieAccess {
    jar: Arc<DocumentCookieJar>,
    paths: Vec<String>,
}

impl DirectCookieAccess {
    pub fn new(jar: Arc<DocumentCookieJar>) -> Self {
        Self::with_paths(jar, DEFAULT_ERASE_PATHS.iter().map(|p| p.to_string()))
    }

    pub fn with_paths(
        jar: Arc<DocumentCookieJar>,
        paths: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            jar,
            paths: paths.into_iter().collect(),
        }
    }

    pub fn jar(&self) -> &Arc<DocumentCookieJar> {
        &self.jar
    }
}

impl CookieAccess for DirectCookieAccess {
    /// Names the jar cannot parse are skipped; every other name is still
    /// expired.
    fn expire(&self, names: &[String]) -> Result<usize, ConsentError> {
        let mut mutations = 0;
        let mut skipped = 0;
        for name in names {
            for path in &self.paths {
                match self.jar.write(&expiry_line(name, path)) {
                    Ok(()) => mutations += 1,
                    Err(e) => {
                        tracing::warn!(name = %name, path = %path, error = %e, "cannot expire cookie");
                        skipped += 1;
                    }
                }
            }
        }
        if skipped > 0 {
            tracing::debug!(mutations, skipped, "expired cookies with skips");
        }
        Ok(mutations)
    }

    fn transport(&self) -> CookieTransport {
        CookieTransport::Direct
    }
}

/// Asks the host broker to expire cookies on the widget's behalf.
pub struct RelayedCookieAccess {
    bus: PageBus,
}

impl RelayedCookieAccess {
    pub fn new(bus: PageBus) -> Self {
        Self { bus }
    }
}

impl CookieAccess for RelayedCookieAccess {
    fn expire(&self, names: &[String]) -> Result<usize, ConsentError> {
        self.bus.emit(PageEvent::DeleteCookies(names.to_vec()))?;
        Ok(0)
    }

    fn transport(&self) -> CookieTransport {
        CookieTransport::Relayed
    }
}
