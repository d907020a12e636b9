//! Widget configuration.
//!
//! Everything here is static input supplied by the page builder: display
//! and deployment mode, labels, links, colour tokens, plus the knobs of the
//! identity and broker protocol. Every field has a default, so an empty JSON
//! object is a valid configuration.

use crate::base::consenterror::ConsentError;
use crate::base::context::{IoResultExt, JsonResultExt};
use crate::broker::event::BrokerPayloadKind;
use crate::broker::retry::DEFAULT_MAX_RETRIES;
use crate::cookies::access::DEFAULT_ERASE_PATHS;
use crate::identity::preview::{PreviewDetector, DEFAULT_PREVIEW_MARKERS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How the banner is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    #[default]
    Footer,
    Modal,
    /// Full-page management view; always loads sections.
    Page,
}

/// Whether the widget can read the host document's cookies itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Direct,
    /// Cookies are only reachable through the host broker.
    Sandboxed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    pub heading: String,
    pub instructions: String,
    pub information_button: String,
    pub view_cookies: String,
    pub confirm_button: String,
    pub reject_button: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            heading: "Manage Cookies".to_string(),
            instructions: "Cookie Instructions".to_string(),
            information_button: "View Privacy Policy".to_string(),
            view_cookies: "View Cookies".to_string(),
            confirm_button: "Confirm Preferences".to_string(),
            reject_button: "Leave Site".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Links {
    /// Privacy policy, opened in a new tab.
    pub information: String,
    /// Cookie list page.
    pub view_cookies: String,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            information: "https://www.salesforce.com".to_string(),
            view_cookies: "https://www.salesforce.com".to_string(),
        }
    }
}

/// Colour tokens handed through to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Colors {
    pub footer_background: String,
    pub footer_link: String,
    pub footer_text: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            footer_background: "rgb(0,0,0)".to_string(),
            footer_link: "rgb(250, 250, 250)".to_string(),
            footer_text: "rgb(250, 250, 250)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityConfig {
    pub primary_cookie: String,
    pub fallback_cookie: String,
    pub preview_markers: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            primary_cookie: "BrowserId".to_string(),
            fallback_cookie: "BrowserId_sec".to_string(),
            preview_markers: DEFAULT_PREVIEW_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl IdentityConfig {
    pub fn preview_detector(&self) -> PreviewDetector {
        PreviewDetector::new(&self.preview_markers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrokerConfig {
    /// Payload the deployed broker variant answers with.
    pub payload: BrokerPayloadKind,
    /// Connect signals re-emitted after an empty answer.
    pub max_retries: u32,
    /// Wait limit per connect signal; `None` waits indefinitely.
    pub response_timeout_ms: Option<u64>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            payload: BrokerPayloadKind::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            response_timeout_ms: None,
        }
    }
}

impl BrokerConfig {
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration options for a consent widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsentConfig {
    pub display_type: DisplayType,
    pub deployment: DeploymentMode,
    pub labels: Labels,
    pub links: Links,
    pub colors: Colors,
    pub alignment: Alignment,
    pub identity: IdentityConfig,
    pub broker: BrokerConfig,
    /// Paths each purged cookie is expired under.
    pub erase_paths: Vec<String>,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            display_type: DisplayType::default(),
            deployment: DeploymentMode::default(),
            labels: Labels::default(),
            links: Links::default(),
            colors: Colors::default(),
            alignment: Alignment::default(),
            identity: IdentityConfig::default(),
            broker: BrokerConfig::default(),
            erase_paths: DEFAULT_ERASE_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ConsentConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConsentError> {
        serde_json::from_str(raw).config_context()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConsentError> {
        let raw = std::fs::read_to_string(path).path_context(path)?;
        Self::from_json(&raw)
    }

    pub fn with_display_type(mut self, display_type: DisplayType) -> Self {
        self.display_type = display_type;
        self
    }

    pub fn with_deployment(mut self, deployment: DeploymentMode) -> Self {
        self.deployment = deployment;
        self
    }

    pub fn with_broker(mut self, broker: BrokerConfig) -> Self {
        self.broker = broker;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(ConsentConfig::from_json("{}").unwrap(), ConsentConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ConsentConfig::from_json(
            r#"{
                "displayType": "page",
                "deployment": "sandboxed",
                "labels": { "heading": "Your privacy" },
                "broker": { "payload": "token", "responseTimeoutMs": 250 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.display_type, DisplayType::Page);
        assert_eq!(config.deployment, DeploymentMode::Sandboxed);
        assert_eq!(config.labels.heading, "Your privacy");
        assert_eq!(config.labels.reject_button, "Leave Site");
        assert_eq!(config.broker.payload, BrokerPayloadKind::Token);
        assert_eq!(config.broker.max_retries, 5);
        assert_eq!(
            config.broker.response_timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_unknown_display_type_rejected() {
        let err = ConsentConfig::from_json(r#"{ "displayType": "banner" }"#).unwrap_err();
        assert!(matches!(err, ConsentError::InvalidConfig { .. }));
    }

    #[test]
    fn test_defaults_match_community_component() {
        let config = ConsentConfig::default();
        assert_eq!(config.identity.primary_cookie, "BrowserId");
        assert_eq!(config.identity.fallback_cookie, "BrowserId_sec");
        assert_eq!(config.erase_paths, vec!["/", "/s"]);
        assert_eq!(config.colors.footer_background, "rgb(0,0,0)");
        assert_eq!(config.broker.response_timeout(), None);
    }
}
