//! The consent state machine.
//!
//! ```text
//! Init -> PreviewCheck -> Idle(Preview)
//!                      -> ResolvingIdentity -> Idle(NoIdentity | BrokerExhausted)
//!                                           -> Verifying -> LoadingSections -> AwaitingUserDecision -> Accepted | Rejected
//!                                                        -> Purging -> Idle(Suppressed)
//! ```
//!
//! Every operation takes `&mut self`, so one widget instance never runs two
//! transitions at once. Failures are recorded in [`ConsentWidget::last_error`]
//! and leave the machine where it was.

use crate::base::consenterror::ConsentError;
use crate::base::state::{ConsentDecision, ConsentState, IdleReason};
use crate::broker::bus::PageBus;
use crate::broker::client::BrokerClient;
use crate::config::{ConsentConfig, DeploymentMode, DisplayType};
use crate::consent::backend::ConsentBackend;
use crate::consent::navigator::{LinkTarget, Navigator, SessionHistory};
use crate::consent::preferences::PreferenceStore;
use crate::consent::section::SectionView;
use crate::cookies::access::{CookieAccess, DirectCookieAccess, RelayedCookieAccess};
use crate::cookies::eraser::CookieEraser;
use crate::cookies::jar::DocumentCookieJar;
use crate::identity::preview::PageLocation;
use crate::identity::resolver::{
    BrokerIdentitySource, CookieIdentitySource, IdentityResolver, IdentitySource,
};
use crate::identity::{BrowserIdentity, Resolution};
use std::sync::Arc;
use url::Url;

/// Builder for [`ConsentWidget`].
///
/// Direct mode needs the document cookie jar, sandboxed mode needs the page
/// bus and must not be handed a jar.
#[derive(Default)]
pub struct ConsentWidgetBuilder {
    config: ConsentConfig,
    location: PageLocation,
    backend: Option<Arc<dyn ConsentBackend>>,
    navigator: Option<Arc<dyn Navigator>>,
    jar: Option<Arc<DocumentCookieJar>>,
    bus: Option<PageBus>,
}

impl ConsentWidgetBuilder {
    pub fn config(mut self, config: ConsentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn location(mut self, location: PageLocation) -> Self {
        self.location = location;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ConsentBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn document_cookies(mut self, jar: Arc<DocumentCookieJar>) -> Self {
        self.jar = Some(jar);
        self
    }

    pub fn page_bus(mut self, bus: PageBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Validate the environment against the deployment mode and wire the
    /// identity source and cookie transport for it.
    ///
    /// In sandboxed mode the broker listener is attached here, once.
    pub fn build(self) -> Result<ConsentWidget, ConsentError> {
        let backend = self
            .backend
            .ok_or_else(|| ConsentError::invalid_config("a consent backend is required"))?;
        let navigator: Arc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(SessionHistory::new()),
        };

        let source: Box<dyn IdentitySource>;
        let access: Arc<dyn CookieAccess>;
        match self.config.deployment {
            DeploymentMode::Direct => {
                let jar = self.jar.ok_or_else(|| {
                    ConsentError::invalid_config("direct mode requires the document cookies")
                })?;
                source = Box::new(CookieIdentitySource::new(jar.clone(), &self.config.identity));
                access = Arc::new(DirectCookieAccess::with_paths(
                    jar,
                    self.config.erase_paths.clone(),
                ));
            }
            DeploymentMode::Sandboxed => {
                if self.jar.is_some() {
                    return Err(ConsentError::invalid_config(
                        "sandboxed mode cannot read the document cookies",
                    ));
                }
                let bus = self.bus.ok_or_else(|| {
                    ConsentError::invalid_config("sandboxed mode requires a page bus")
                })?;
                source = Box::new(BrokerIdentitySource::new(BrokerClient::new(
                    &bus,
                    &self.config.broker,
                )));
                access = Arc::new(RelayedCookieAccess::new(bus));
            }
        }

        tracing::debug!(
            mode = ?self.config.deployment,
            display = ?self.config.display_type,
            "consent widget created"
        );

        let resolver =
            IdentityResolver::new(self.location, self.config.identity.preview_detector(), source);

        Ok(ConsentWidget {
            config: self.config,
            resolver,
            backend,
            eraser: CookieEraser::new(access),
            navigator,
            state: ConsentState::Init,
            decision: ConsentDecision::Unknown,
            identity: None,
            sections: Vec::new(),
            preferences: PreferenceStore::new(),
            show_dialog: false,
            loading: true,
            connection_error: false,
            last_error: None,
        })
    }
}

/// A cookie consent banner bound to one page view.
pub struct ConsentWidget {
    config: ConsentConfig,
    resolver: IdentityResolver,
    backend: Arc<dyn ConsentBackend>,
    eraser: CookieEraser,
    navigator: Arc<dyn Navigator>,
    state: ConsentState,
    decision: ConsentDecision,
    identity: Option<BrowserIdentity>,
    sections: Vec<SectionView>,
    preferences: PreferenceStore,
    show_dialog: bool,
    loading: bool,
    connection_error: bool,
    last_error: Option<ConsentError>,
}

impl ConsentWidget {
    pub fn builder() -> ConsentWidgetBuilder {
        ConsentWidgetBuilder::default()
    }

    /// Run the widget from `Init` until it needs the visitor or comes to rest.
    ///
    /// Only the first call does anything; later calls return the current
    /// state untouched.
    pub async fn connect(&mut self) -> ConsentState {
        if self.state != ConsentState::Init {
            tracing::debug!(state = ?self.state, "widget already connected");
            return self.state;
        }

        self.transition(ConsentState::PreviewCheck);
        if self.resolver.is_preview() {
            self.transition(ConsentState::Idle(IdleReason::Preview));
            return self.state;
        }

        self.transition(ConsentState::ResolvingIdentity);
        let identity = match self.resolver.resolve().await {
            Ok(Resolution::Resolved(identity)) => identity,
            Ok(Resolution::Preview) => {
                self.transition(ConsentState::Idle(IdleReason::Preview));
                return self.state;
            }
            Ok(Resolution::Missing) => {
                self.transition(ConsentState::Idle(IdleReason::NoIdentity));
                return self.state;
            }
            Err(e @ ConsentError::BrokerExhausted { .. }) => {
                if !self.connection_error {
                    tracing::warn!(error = %e, "cookie broker connection failed");
                    self.connection_error = true;
                }
                self.last_error = Some(e);
                self.transition(ConsentState::Idle(IdleReason::BrokerExhausted));
                return self.state;
            }
            Err(e) => {
                self.record(e);
                return self.state;
            }
        };
        self.identity = Some(identity.clone());

        self.transition(ConsentState::Verifying);
        let consented = match self.backend.verify_identity(&identity).await {
            Ok(consented) => consented,
            Err(e) => {
                self.record(e);
                return self.state;
            }
        };
        self.decision = ConsentDecision::from_verification(consented);
        self.show_dialog = !consented;

        if !consented || self.config.display_type == DisplayType::Page {
            self.load_sections().await;
        } else {
            self.purge(&identity).await;
        }
        self.state
    }

    async fn load_sections(&mut self) {
        self.transition(ConsentState::LoadingSections);
        self.loading = true;

        let sections = match self.backend.fetch_consent_sections().await {
            Ok(sections) => sections,
            Err(e) => {
                self.record(e);
                return;
            }
        };

        for section in &sections {
            match section.seed() {
                Ok((form_id, default)) => self.preferences.set_default(form_id, default),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed section");
                    self.last_error = Some(e);
                }
            }
        }
        tracing::debug!(
            sections = sections.len(),
            preferences = self.preferences.len(),
            "consent sections loaded"
        );

        self.sections = sections.into_iter().map(SectionView::new).collect();
        self.loading = false;
        self.transition(ConsentState::AwaitingUserDecision);
    }

    async fn purge(&mut self, identity: &BrowserIdentity) {
        self.transition(ConsentState::Purging);

        let names = match self.backend.fetch_cookies_to_delete(identity).await {
            Ok(names) => names,
            Err(e) => {
                self.record(e);
                return;
            }
        };

        if let Err(e) = self.eraser.erase(&names) {
            self.record(e);
            return;
        }
        self.transition(ConsentState::Idle(IdleReason::Suppressed));
    }

    /// Persist the current preferences and hide the dialog.
    pub async fn accept(&mut self) -> Result<(), ConsentError> {
        let identity = self.awaiting_identity()?;
        let preferences = self.preferences.to_vec();

        if let Err(e) = self.backend.submit_consent(&identity, preferences).await {
            self.record(e.clone());
            return Err(e);
        }

        self.show_dialog = false;
        self.transition(ConsentState::Accepted);
        Ok(())
    }

    /// Leave the site. Nothing is sent to the backend.
    pub fn reject(&mut self) -> Result<(), ConsentError> {
        if self.state != ConsentState::AwaitingUserDecision {
            return Err(ConsentError::NotAwaitingDecision);
        }
        self.navigator.history_back();
        self.transition(ConsentState::Rejected);
        Ok(())
    }

    /// Record the visitor's toggle for one authorization form.
    pub fn update_section_status(&mut self, form_id: &str, value: bool) -> Result<(), ConsentError> {
        if self.state != ConsentState::AwaitingUserDecision {
            return Err(ConsentError::NotAwaitingDecision);
        }
        tracing::trace!(form_id, value, "preference updated");
        self.preferences.update(form_id, value);
        Ok(())
    }

    /// Expand or collapse every section named `section_id`. Returns how many
    /// sections were toggled.
    pub fn toggle_section(&mut self, section_id: &str) -> usize {
        let mut toggled = 0;
        for view in self
            .sections
            .iter_mut()
            .filter(|v| v.section.section_id == section_id)
        {
            view.toggle();
            toggled += 1;
        }
        toggled
    }

    /// Open the privacy policy in a new tab.
    pub fn open_information(&self) -> Result<(), ConsentError> {
        self.open_link(&self.config.links.information, LinkTarget::Blank)
    }

    pub fn open_cookie_list(&self) -> Result<(), ConsentError> {
        self.open_link(&self.config.links.view_cookies, LinkTarget::Default)
    }

    fn open_link(&self, link: &str, target: LinkTarget) -> Result<(), ConsentError> {
        let url = Url::parse(link).map_err(|_| ConsentError::InvalidUrl)?;
        self.navigator.open(url.as_str(), target);
        Ok(())
    }

    fn awaiting_identity(&self) -> Result<BrowserIdentity, ConsentError> {
        match (&self.state, &self.identity) {
            (ConsentState::AwaitingUserDecision, Some(identity)) => Ok(identity.clone()),
            _ => Err(ConsentError::NotAwaitingDecision),
        }
    }

    fn transition(&mut self, next: ConsentState) {
        tracing::debug!(from = ?self.state, to = ?next, "consent state");
        if next.is_terminal() {
            tracing::info!(state = ?next, "consent widget settled");
        }
        self.state = next;
    }

    fn record(&mut self, error: ConsentError) {
        tracing::warn!(state = ?self.state, code = error.as_i32(), error = %error, "consent step failed");
        self.last_error = Some(error);
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    pub fn decision(&self) -> ConsentDecision {
        self.decision
    }

    pub fn identity(&self) -> Option<&BrowserIdentity> {
        self.identity.as_ref()
    }

    pub fn mode(&self) -> DeploymentMode {
        self.resolver.mode()
    }

    pub fn config(&self) -> &ConsentConfig {
        &self.config
    }

    pub fn sections(&self) -> &[SectionView] {
        &self.sections
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// The dialog flag: `!already_consented` once verification completed.
    pub fn show_dialog(&self) -> bool {
        self.show_dialog
    }

    /// Whether the dialog should be on screen right now.
    pub fn should_show_dialog(&self) -> bool {
        self.show_dialog && self.state == ConsentState::AwaitingUserDecision
    }

    pub fn footer_visible(&self) -> bool {
        self.config.display_type == DisplayType::Footer && self.show_dialog
    }

    pub fn is_modal(&self) -> bool {
        self.config.display_type == DisplayType::Modal
    }

    pub fn is_page(&self) -> bool {
        self.config.display_type == DisplayType::Page
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Set once the cookie broker exhausted its retries; never cleared.
    pub fn connection_error(&self) -> bool {
        self.connection_error
    }

    pub fn last_error(&self) -> Option<&ConsentError> {
        self.last_error.as_ref()
    }
}

impl std::fmt::Debug for ConsentWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentWidget")
            .field("mode", &self.resolver.mode())
            .field("display_type", &self.config.display_type)
            .field("state", &self.state)
            .field("decision", &self.decision)
            .field("show_dialog", &self.show_dialog)
            .field("connection_error", &self.connection_error)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
