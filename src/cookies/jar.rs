use crate::base::consenterror::ConsentError;
use crate::cookies::canonical_cookie::DocumentCookie;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies a single document keeps (Chromium per-domain default).
const MAX_COOKIES_PER_DOCUMENT: usize = 50;

/// The cookie store of one host document, as seen through `document.cookie`.
///
/// Reads return the `name=value; ...` string visible at the document's path;
/// writes take a single `Set-Cookie`-style line. Writing a line whose expiry
/// has already passed deletes the matching cookie, which is how the eraser
/// invalidates cookies.
pub struct DocumentCookieJar {
    location: Url,
    // Store: Map<Path, List<Cookie>>
    store: Arc<DashMap<String, Vec<DocumentCookie>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl DocumentCookieJar {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            store: Arc::new(DashMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Parse a document location and create an empty jar for it.
    pub fn for_location(location: &str) -> Result<Self, ConsentError> {
        let url = Url::parse(location).map_err(|_| ConsentError::InvalidUrl)?;
        Ok(Self::new(url))
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Equivalent of `document.cookie = line`.
    pub fn write(&self, line: &str) -> Result<(), ConsentError> {
        use cookie::Cookie;

        let parsed = Cookie::parse(line).map_err(|e| {
            tracing::debug!(error = %e, "rejecting unparsable cookie line");
            ConsentError::InvalidCookie
        })?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        let now = OffsetDateTime::now_utc();
        let path = parsed
            .path()
            .map(str::to_string)
            .unwrap_or_else(|| Self::default_path(self.location.path()));

        // Max-Age wins over Expires
        let expiration_time = match parsed.max_age() {
            Some(max_age) => Some(now + max_age),
            None => parsed.expires().and_then(|e| e.datetime()),
        };

        let mut cookie = DocumentCookie::new(parsed.name(), parsed.value(), path, now);
        if let Some(expiry) = expiration_time {
            cookie = cookie.with_expiration(expiry);
        }
        cookie.secure = parsed.secure().unwrap_or(false);

        self.set_cookie(cookie, now);
        Ok(())
    }

    /// Store a cookie, replacing any cookie with the same name and path.
    /// An already expired cookie only removes its predecessor.
    pub fn set_cookie(&self, cookie: DocumentCookie, now: OffsetDateTime) {
        let mut entry = self.store.entry(cookie.path.clone()).or_default();
        entry.retain(|c| c.name != cookie.name);

        if cookie.is_expired(now) {
            tracing::trace!(name = %cookie.name, path = %cookie.path, "cookie expired");
            return;
        }

        entry.push(cookie);
        drop(entry);

        self.enforce_limit();
    }

    fn enforce_limit(&self) {
        while self.cookie_count() > MAX_COOKIES_PER_DOCUMENT {
            let mut oldest: Option<(String, usize, OffsetDateTime)> = None;

            for entry in self.store.iter() {
                for (idx, cookie) in entry.value().iter().enumerate() {
                    let older = oldest
                        .as_ref()
                        .map_or(true, |(_, _, t)| cookie.creation_time < *t);
                    if older {
                        oldest = Some((entry.key().clone(), idx, cookie.creation_time));
                    }
                }
            }

            match oldest {
                Some((path, idx, _)) => {
                    if let Some(mut entry) = self.store.get_mut(&path) {
                        if idx < entry.len() {
                            entry.remove(idx);
                        }
                    }
                }
                None => break,
            }
        }
    }

    /// Cookies visible at the document's path, longest path first.
    pub fn visible_cookies(&self) -> Vec<DocumentCookie> {
        let now = OffsetDateTime::now_utc();
        let request_path = self.location.path();

        let mut result: Vec<DocumentCookie> = self
            .store
            .iter()
            .filter(|entry| Self::path_matches(entry.key(), request_path))
            .flat_map(|entry| entry.value().clone())
            .filter(|cookie| !cookie.is_expired(now))
            .filter(|cookie| !cookie.secure || self.location.scheme() == "https")
            .collect();

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// Equivalent of reading `document.cookie`.
    pub fn read_all(&self) -> String {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.visible_cookies()
            .iter()
            .map(DocumentCookie::pair)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// First visible value for `name`, `None` when absent or empty.
    pub fn get(&self, name: &str) -> Option<String> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.visible_cookies()
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
            .filter(|value| !value.is_empty())
    }

    /// Whether a cookie with this name is stored under this exact path.
    pub fn contains(&self, name: &str, path: &str) -> bool {
        self.store
            .get(path)
            .is_some_and(|entry| entry.iter().any(|c| c.name == name))
    }

    /// Number of reads of the cookie string since creation.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of accepted cookie writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            if cookie_path.ends_with('/') {
                return true;
            }
            return request_path[cookie_path.len()..].starts_with('/');
        }

        false
    }

    /// RFC 6265 default-path of a request path.
    fn default_path(request_path: &str) -> String {
        if !request_path.starts_with('/') {
            return "/".to_string();
        }
        match request_path.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(idx) => request_path[..idx].to_string(),
        }
    }
}
