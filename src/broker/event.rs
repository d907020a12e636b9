//! Page-scoped signals exchanged between the widget and the host broker.

use crate::identity::BrowserIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fired by the widget to ask the broker for data.
pub const COMPONENT_CONNECTED: &str = "componentConnected";
/// Fired by the broker in answer to a connect signal.
pub const DOCUMENT_COOKIES: &str = "documentCookies";
/// Fired by the widget to have the broker expire cookies.
pub const DELETE_COOKIES: &str = "deleteCookies";

/// Per-widget token used to correlate broker answers with the widget
/// instance that asked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the broker variant in use puts in its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrokerPayloadKind {
    /// Echo of the widget's correlation token.
    Token,
    /// Device fingerprint computed by the host page.
    #[default]
    Fingerprint,
    /// The raw `document.cookie` string.
    RawCookies,
}

/// Data carried by a `documentCookies` signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerPayload {
    Token(String),
    Fingerprint(u32),
    RawCookies(String),
    /// The broker had nothing to give.
    Empty,
}

impl BrokerPayload {
    pub fn kind(&self) -> Option<BrokerPayloadKind> {
        match self {
            BrokerPayload::Token(_) => Some(BrokerPayloadKind::Token),
            BrokerPayload::Fingerprint(_) => Some(BrokerPayloadKind::Fingerprint),
            BrokerPayload::RawCookies(_) => Some(BrokerPayloadKind::RawCookies),
            BrokerPayload::Empty => None,
        }
    }

    /// Collapse the payload into an opaque identity; `None` when unusable.
    pub fn identity(&self) -> Option<BrowserIdentity> {
        match self {
            BrokerPayload::Token(token) => BrowserIdentity::new(token.as_str()),
            BrokerPayload::Fingerprint(fingerprint) => {
                BrowserIdentity::new(fingerprint.to_string())
            }
            BrokerPayload::RawCookies(raw) => BrowserIdentity::new(raw.as_str()),
            BrokerPayload::Empty => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSignal {
    pub token: CorrelationToken,
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSignal {
    pub token: CorrelationToken,
    pub attempt: u32,
    pub payload: BrokerPayload,
}

impl DataSignal {
    /// An answer to `connect` carrying `payload`.
    pub fn reply(connect: &ConnectSignal, payload: BrokerPayload) -> Self {
        Self {
            token: connect.token.clone(),
            attempt: connect.attempt,
            payload,
        }
    }
}

/// Every signal on the page bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    ComponentConnected(ConnectSignal),
    DocumentCookies(DataSignal),
    DeleteCookies(Vec<String>),
}

impl PageEvent {
    /// The event name the host page dispatches this signal under.
    pub fn name(&self) -> &'static str {
        match self {
            PageEvent::ComponentConnected(_) => COMPONENT_CONNECTED,
            PageEvent::DocumentCookies(_) => DOCUMENT_COOKIES,
            PageEvent::DeleteCookies(_) => DELETE_COOKIES,
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, PageEvent::ComponentConnected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let token = CorrelationToken::from("w-1");
        let connect = ConnectSignal { token, attempt: 1 };
        assert_eq!(
            PageEvent::ComponentConnected(connect.clone()).name(),
            "componentConnected"
        );
        assert_eq!(
            PageEvent::DocumentCookies(DataSignal::reply(&connect, BrokerPayload::Empty)).name(),
            "documentCookies"
        );
        assert_eq!(PageEvent::DeleteCookies(vec![]).name(), "deleteCookies");
    }

    #[test]
    fn test_payload_identity() {
        assert_eq!(
            BrokerPayload::Fingerprint(42).identity().unwrap().as_str(),
            "42"
        );
        assert_eq!(
            BrokerPayload::RawCookies("BrowserId=x".into())
                .identity()
                .unwrap()
                .as_str(),
            "BrowserId=x"
        );
        assert!(BrokerPayload::RawCookies(String::new()).identity().is_none());
        assert!(BrokerPayload::Token(String::new()).identity().is_none());
        assert_eq!(
            BrokerPayload::Token("  ".into()).identity().unwrap().as_str(),
            "  "
        );
        assert!(BrokerPayload::Empty.identity().is_none());
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(CorrelationToken::generate(), CorrelationToken::generate());
    }

    #[test]
    fn test_payload_kind_serde() {
        let kind: BrokerPayloadKind = serde_json::from_str("\"rawCookies\"").unwrap();
        assert_eq!(kind, BrokerPayloadKind::RawCookies);
        assert_eq!(BrokerPayload::Token("t".into()).kind(), Some(BrokerPayloadKind::Token));
    }
}
