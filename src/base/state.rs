/// Why a widget came to rest without showing or completing a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    /// The page is a design-time or live preview.
    Preview,
    /// Neither identity cookie was present.
    NoIdentity,
    /// The cookie broker never produced a usable payload.
    BrokerExhausted,
    /// Consent already exists; disallowed cookies were purged instead.
    Suppressed,
}

/// The current state of a consent widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsentState {
    /// Constructed, not yet connected.
    #[default]
    Init,

    /// Checking whether the page is a preview.
    PreviewCheck,

    /// Reading cookies or waiting on the cookie broker.
    ResolvingIdentity,

    /// Waiting for the backend to verify the identity.
    Verifying,

    /// Fetching consent sections.
    LoadingSections,

    /// Fetching and erasing cookies the visitor did not consent to.
    Purging,

    /// Sections are loaded and the visitor has to accept or reject.
    AwaitingUserDecision,

    /// Preferences were persisted.
    Accepted,

    /// The visitor left the site.
    Rejected,

    /// Resting without a dialog.
    Idle(IdleReason),
}

impl ConsentState {
    /// No further transition can leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConsentState::Idle(_) | ConsentState::Accepted | ConsentState::Rejected
        )
    }
}

/// Outcome of backend verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsentDecision {
    #[default]
    Unknown,
    Granted,
    Withheld,
}

impl ConsentDecision {
    pub fn from_verification(already_consented: bool) -> Self {
        if already_consented {
            ConsentDecision::Granted
        } else {
            ConsentDecision::Withheld
        }
    }
}
