use time::OffsetDateTime;

/// Expiry written when invalidating a cookie.
pub const EPOCH_EXPIRY: &str = "Thu, 01 Jan 1970 00:00:01 GMT";

/// Represents a cookie held by the host document.
/// Only the attributes that `document.cookie` exposes or honours are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
}

impl DocumentCookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        path: impl Into<String>,
        creation_time: OffsetDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: path.into(),
            creation_time,
            expiration_time: None,
            secure: false,
        }
    }

    pub fn with_expiration(mut self, expiration_time: OffsetDateTime) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }

    /// Session cookies never expire while the document lives.
    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        self.expiration_time
            .is_some_and(|expiry| expiry <= current_time)
    }

    /// The `name=value` pair as it appears in `document.cookie`.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Build the cookie line that invalidates `name` under `path`.
pub fn expiry_line(name: &str, path: &str) -> String {
    format!("{name}=; expires={EPOCH_EXPIRY};path={path};")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_line_format() {
        assert_eq!(
            expiry_line("_ga", "/s"),
            "_ga=; expires=Thu, 01 Jan 1970 00:00:01 GMT;path=/s;"
        );
    }

    #[test]
    fn test_session_cookie_never_expires() {
        let now = OffsetDateTime::now_utc();
        let cookie = DocumentCookie::new("BrowserId", "abc", "/", now);
        assert!(!cookie.is_expired(now + time::Duration::days(365)));
    }

    #[test]
    fn test_epoch_cookie_is_expired() {
        let now = OffsetDateTime::now_utc();
        let cookie = DocumentCookie::new("a", "", "/", now)
            .with_expiration(OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(1));
        assert!(cookie.is_expired(now));
        assert_eq!(cookie.pair(), "a=");
    }
}
