//! Identity sources and the resolver that fronts them.

use crate::base::consenterror::ConsentError;
use crate::broker::client::BrokerClient;
use crate::config::{DeploymentMode, IdentityConfig};
use crate::cookies::jar::DocumentCookieJar;
use crate::identity::preview::{PageLocation, PreviewDetector};
use crate::identity::{BrowserIdentity, Resolution};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Alias for the `Future` an identity source returns.
pub type Sourcing<'a> =
    Pin<Box<dyn Future<Output = Result<Option<BrowserIdentity>, ConsentError>> + Send + 'a>>;

/// Where an identity comes from in one deployment mode.
///
/// Returning `Ok(None)` means "no identity exists", which is not an error.
pub trait IdentitySource: Send {
    fn mode(&self) -> DeploymentMode;

    fn fetch(&mut self) -> Sourcing<'_>;
}

/// Reads the identity cookie, then its fallback, from the document jar.
pub struct CookieIdentitySource {
    jar: Arc<DocumentCookieJar>,
    primary: String,
    fallback: String,
}

impl CookieIdentitySource {
    pub fn new(jar: Arc<DocumentCookieJar>, config: &IdentityConfig) -> Self {
        Self {
            jar,
            primary: config.primary_cookie.clone(),
            fallback: config.fallback_cookie.clone(),
        }
    }

    fn read(&self) -> Option<BrowserIdentity> {
        if let Some(identity) = self.jar.get(&self.primary).and_then(BrowserIdentity::new) {
            return Some(identity);
        }
        tracing::debug!(cookie = %self.primary, "identity cookie absent, trying fallback");
        self.jar.get(&self.fallback).and_then(BrowserIdentity::new)
    }
}

impl IdentitySource for CookieIdentitySource {
    fn mode(&self) -> DeploymentMode {
        DeploymentMode::Direct
    }

    fn fetch(&mut self) -> Sourcing<'_> {
        let identity = self.read();
        Box::pin(async move { Ok(identity) })
    }
}

/// Obtains the identity through the host broker. Holds no cookie jar.
pub struct BrokerIdentitySource {
    client: BrokerClient,
}

impl BrokerIdentitySource {
    pub fn new(client: BrokerClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BrokerClient {
        &self.client
    }
}

impl IdentitySource for BrokerIdentitySource {
    fn mode(&self) -> DeploymentMode {
        DeploymentMode::Sandboxed
    }

    fn fetch(&mut self) -> Sourcing<'_> {
        Box::pin(async move { self.client.request_identity().await.map(Some) })
    }
}

/// Produces the visitor identity once per widget instance.
///
/// Preview pages short-circuit before the source is touched. After a
/// successful resolution every further call returns the cached identity
/// without reading cookies or emitting broker signals.
pub struct IdentityResolver {
    location: PageLocation,
    detector: PreviewDetector,
    source: Box<dyn IdentitySource>,
    resolved: Option<BrowserIdentity>,
}

impl IdentityResolver {
    pub fn new(
        location: PageLocation,
        detector: PreviewDetector,
        source: Box<dyn IdentitySource>,
    ) -> Self {
        Self {
            location,
            detector,
            source,
            resolved: None,
        }
    }

    pub fn mode(&self) -> DeploymentMode {
        self.source.mode()
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn is_preview(&self) -> bool {
        self.detector.is_preview(&self.location)
    }

    pub fn identity(&self) -> Option<&BrowserIdentity> {
        self.resolved.as_ref()
    }

    pub async fn resolve(&mut self) -> Result<Resolution, ConsentError> {
        if self.is_preview() {
            tracing::debug!(href = %self.location.href, "preview page, skipping identity");
            return Ok(Resolution::Preview);
        }

        if let Some(identity) = &self.resolved {
            return Ok(Resolution::Resolved(identity.clone()));
        }

        match self.source.fetch().await? {
            Some(identity) => {
                tracing::debug!(mode = ?self.source.mode(), "identity resolved");
                self.resolved = Some(identity.clone());
                Ok(Resolution::Resolved(identity))
            }
            None => {
                tracing::debug!(mode = ?self.source.mode(), "no identity available");
                Ok(Resolution::Missing)
            }
        }
    }
}
