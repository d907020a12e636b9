//! Remote consent service boundary.
//!
//! The widget talks to the service through [`ConsentBackend`]; transport and
//! storage belong to the implementation. [`MemoryConsentBackend`] keeps the
//! records in memory with the same semantics as the hosted service.

use crate::base::consenterror::ConsentError;
use crate::consent::preferences::PreferenceEntry;
use crate::consent::section::ConsentSection;
use crate::identity::BrowserIdentity;
use dashmap::DashMap;
use futures::future::{self, FutureExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Alias for the `Future` every backend operation returns.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ConsentError>> + Send + 'a>>;

/// The four remote operations, named after the service methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    VerifyIdentity,
    FetchSections,
    FetchCookiesToDelete,
    SubmitConsent,
}

impl BackendOperation {
    pub fn method_name(&self) -> &'static str {
        match self {
            BackendOperation::VerifyIdentity => "verifyBrowserId",
            BackendOperation::FetchSections => "getCookieData",
            BackendOperation::FetchCookiesToDelete => "getCookiesToDrop",
            BackendOperation::SubmitConsent => "createCookieConsentRecords",
        }
    }
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Trait for the remote consent service.
///
/// Implementations must be thread-safe; the widget holds one behind an `Arc`.
pub trait ConsentBackend: Send + Sync {
    /// Whether consent records already exist for `identity`.
    fn verify_identity<'a>(&'a self, identity: &'a BrowserIdentity) -> BackendFuture<'a, bool>;

    fn fetch_consent_sections(&self) -> BackendFuture<'_, Vec<ConsentSection>>;

    /// Names of cookies the visitor has not consented to.
    fn fetch_cookies_to_delete<'a>(
        &'a self,
        identity: &'a BrowserIdentity,
    ) -> BackendFuture<'a, Vec<String>>;

    fn submit_consent<'a>(
        &'a self,
        identity: &'a BrowserIdentity,
        preferences: Vec<PreferenceEntry>,
    ) -> BackendFuture<'a, ()>;
}

/// Blanket implementation for Arc-wrapped backends.
impl<B: ConsentBackend + ?Sized> ConsentBackend for Arc<B> {
    fn verify_identity<'a>(&'a self, identity: &'a BrowserIdentity) -> BackendFuture<'a, bool> {
        (**self).verify_identity(identity)
    }

    fn fetch_consent_sections(&self) -> BackendFuture<'_, Vec<ConsentSection>> {
        (**self).fetch_consent_sections()
    }

    fn fetch_cookies_to_delete<'a>(
        &'a self,
        identity: &'a BrowserIdentity,
    ) -> BackendFuture<'a, Vec<String>> {
        (**self).fetch_cookies_to_delete(identity)
    }

    fn submit_consent<'a>(
        &'a self,
        identity: &'a BrowserIdentity,
        preferences: Vec<PreferenceEntry>,
    ) -> BackendFuture<'a, ()> {
        (**self).submit_consent(identity, preferences)
    }
}

/// In-memory consent service.
///
/// - `verify_identity` is true once any record exists for the identity.
/// - `submit_consent` replaces the identity's records.
/// - `fetch_cookies_to_delete` lists the cookies of every section whose
///   recorded preference is false, falling back to the section default.
#[derive(Default)]
pub struct MemoryConsentBackend {
    sections: Vec<ConsentSection>,
    records: DashMap<BrowserIdentity, Vec<PreferenceEntry>>,
    failures: DashMap<BackendOperation, String>,
    calls: DashMap<BackendOperation, usize>,
}

impl MemoryConsentBackend {
    pub fn new(sections: Vec<ConsentSection>) -> Self {
        Self {
            sections,
            ..Default::default()
        }
    }

    /// Store records as if the visitor had consented in an earlier session.
    pub fn with_records(self, identity: BrowserIdentity, records: Vec<PreferenceEntry>) -> Self {
        self.records.insert(identity, records);
        self
    }

    /// Make every later call of `operation` fail with `message`.
    pub fn fail(&self, operation: BackendOperation, message: impl Into<String>) {
        self.failures.insert(operation, message.into());
    }

    pub fn recover(&self, operation: BackendOperation) {
        self.failures.remove(&operation);
    }

    pub fn call_count(&self, operation: BackendOperation) -> usize {
        self.calls.get(&operation).map_or(0, |count| *count)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    pub fn records(&self, identity: &BrowserIdentity) -> Option<Vec<PreferenceEntry>> {
        self.records.get(identity).map(|entry| entry.value().clone())
    }

    fn enter(&self, operation: BackendOperation) -> Result<(), ConsentError> {
        *self.calls.entry(operation).or_insert(0) += 1;
        match self.failures.get(&operation) {
            Some(message) => {
                tracing::debug!(%operation, "injected backend failure");
                Err(ConsentError::backend_failed(operation, message.value().clone()))
            }
            None => Ok(()),
        }
    }

    fn cookies_to_delete(&self, identity: &BrowserIdentity) -> Vec<String> {
        let records = self.records(identity).unwrap_or_default();
        let recorded = |form_id: &str| {
            records
                .iter()
                .find(|entry| entry.form_id == form_id)
                .map(|entry| entry.value)
        };

        self.sections
            .iter()
            .filter(|section| {
                let allowed = section
                    .related_form_id
                    .as_deref()
                    .and_then(|form_id| recorded(form_id))
                    .or(section.default_value)
                    .unwrap_or(false);
                !allowed
            })
            .flat_map(|section| section.cookie_names().map(str::to_string))
            .collect()
    }
}

impl ConsentBackend for MemoryConsentBackend {
    fn verify_identity<'a>(&'a self, identity: &'a BrowserIdentity) -> BackendFuture<'a, bool> {
        let result = self
            .enter(BackendOperation::VerifyIdentity)
            .map(|()| self.records.contains_key(identity));
        future::ready(result).boxed()
    }

    fn fetch_consent_sections(&self) -> BackendFuture<'_, Vec<ConsentSection>> {
        let result = self
            .enter(BackendOperation::FetchSections)
            .map(|()| self.sections.clone());
        future::ready(result).boxed()
    }

    fn fetch_cookies_to_delete<'a>(
        &'a self,
        identity: &'a BrowserIdentity,
    ) -> BackendFuture<'a, Vec<String>> {
        let result = self
            .enter(BackendOperation::FetchCookiesToDelete)
            .map(|()| self.cookies_to_delete(identity));
        future::ready(result).boxed()
    }

    fn submit_consent<'a>(
        &'a self,
        identity: &'a BrowserIdentity,
        preferences: Vec<PreferenceEntry>,
    ) -> BackendFuture<'a, ()> {
        let result = self.enter(BackendOperation::SubmitConsent).map(|()| {
            tracing::debug!(%identity, count = preferences.len(), "storing consent records");
            self.records.insert(identity.clone(), preferences);
        });
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> Vec<ConsentSection> {
        vec![
            ConsentSection::new("Required", "f-req", true).with_cookie("sid"),
            ConsentSection::new("Analytics", "f-ana", false)
                .with_cookie("_ga")
                .with_cookie("_gid"),
            ConsentSection::new("Ads", "f-ads", true).with_cookie("_fbp"),
        ]
    }

    fn visitor() -> BrowserIdentity {
        BrowserIdentity::new("visitor-1").unwrap()
    }

    #[tokio::test]
    async fn test_verify_follows_records() {
        let backend = MemoryConsentBackend::new(sections());
        assert!(!backend.verify_identity(&visitor()).await.unwrap());

        backend
            .submit_consent(&visitor(), vec![PreferenceEntry::new("f-ana", true)])
            .await
            .unwrap();
        assert!(backend.verify_identity(&visitor()).await.unwrap());
        assert_eq!(backend.call_count(BackendOperation::VerifyIdentity), 2);
    }

    #[tokio::test]
    async fn test_cookies_to_delete_uses_records_then_defaults() {
        let backend = MemoryConsentBackend::new(sections()).with_records(
            visitor(),
            vec![
                PreferenceEntry::new("f-ana", true),
                PreferenceEntry::new("f-ads", false),
            ],
        );
        let names = backend.fetch_cookies_to_delete(&visitor()).await.unwrap();
        assert_eq!(names, vec!["_fbp"]);

        let stranger = BrowserIdentity::new("other").unwrap();
        let names = backend.fetch_cookies_to_delete(&stranger).await.unwrap();
        assert_eq!(names, vec!["_ga", "_gid"]);
    }

    #[tokio::test]
    async fn test_submit_replaces_records() {
        let backend = MemoryConsentBackend::new(sections());
        backend
            .submit_consent(&visitor(), vec![PreferenceEntry::new("f-ana", true)])
            .await
            .unwrap();
        backend
            .submit_consent(&visitor(), vec![PreferenceEntry::new("f-ads", false)])
            .await
            .unwrap();
        assert_eq!(
            backend.records(&visitor()),
            Some(vec![PreferenceEntry::new("f-ads", false)])
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = MemoryConsentBackend::new(sections());
        backend.fail(BackendOperation::FetchSections, "timeout");

        let err = backend.fetch_consent_sections().await.unwrap_err();
        assert_eq!(err.to_string(), "Backend call getCookieData failed: timeout");

        backend.recover(BackendOperation::FetchSections);
        assert_eq!(backend.fetch_consent_sections().await.unwrap().len(), 3);
        assert_eq!(backend.total_calls(), 2);
    }
}
