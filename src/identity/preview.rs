use serde::{Deserialize, Serialize};
use url::Url;

/// Substrings marking site builder and live preview hosts.
pub const DEFAULT_PREVIEW_MARKERS: [&str; 2] = ["sitepreview", "livepreview"];

/// Where the widget is loaded: `window.location.href` and `.hostname`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    pub href: String,
    pub hostname: String,
}

impl PageLocation {
    pub fn new(href: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            hostname: hostname.into(),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::new(url.as_str(), url.host_str().unwrap_or_default())
    }

    /// The string preview detection inspects: the href, or the hostname when
    /// the href is empty.
    fn inspected(&self) -> &str {
        if self.href.is_empty() {
            &self.hostname
        } else {
            &self.href
        }
    }
}

/// Decides whether a page is a preview. Pure: no I/O of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewDetector {
    markers: Vec<String>,
}

impl Default for PreviewDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_MARKERS)
    }
}

impl PreviewDetector {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn is_preview(&self, location: &PageLocation) -> bool {
        let inspected = location.inspected().to_lowercase();
        self.markers.iter().any(|marker| inspected.contains(marker))
    }
}
