//! Widget side of the cross-context broker protocol.

use crate::base::consenterror::ConsentError;
use crate::broker::bus::PageBus;
use crate::broker::event::{
    BrokerPayloadKind, ConnectSignal, CorrelationToken, DataSignal, PageEvent,
};
use crate::broker::retry::RetryPolicy;
use crate::config::BrokerConfig;
use crate::identity::BrowserIdentity;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::time::Instant;

/// Where the exchange with the broker stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BrokerState {
    /// Nothing asked yet.
    #[default]
    Idle,
    /// Waiting on the answer to connect attempt `attempt`.
    PendingRetry { attempt: u32 },
    Resolved(BrowserIdentity),
    /// Retry budget spent without a usable payload.
    Exhausted,
}

/// What one broker answer means for the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Resolved(BrowserIdentity),
    /// Empty answer with budget left; emit connect again.
    Retry,
    /// Empty answer on the last permitted attempt.
    Exhausted,
    /// Not ours, stale, or arriving after the exchange finished.
    Ignored,
}

/// Requests cookie-derived data from the host broker.
///
/// The client subscribes to the page bus once, when it is created, and keeps
/// that single listener for its whole lifetime. Answers that race with a
/// retry are tolerated: a usable payload from an older attempt still
/// resolves, anything arriving after resolution is ignored. Only payloads of
/// the configured kind are usable; any other kind counts as empty.
pub struct BrokerClient {
    bus: PageBus,
    listener: Receiver<PageEvent>,
    token: CorrelationToken,
    payload: BrokerPayloadKind,
    policy: RetryPolicy,
    response_timeout: Option<Duration>,
    state: BrokerState,
}

impl BrokerClient {
    pub fn new(bus: &PageBus, config: &BrokerConfig) -> Self {
        Self {
            bus: bus.clone(),
            listener: bus.subscribe(),
            token: CorrelationToken::generate(),
            payload: config.payload,
            policy: RetryPolicy::new(config.max_retries),
            response_timeout: config.response_timeout(),
            state: BrokerState::Idle,
        }
    }

    pub fn token(&self) -> &CorrelationToken {
        &self.token
    }

    /// The payload kind this client accepts.
    pub fn payload_kind(&self) -> BrokerPayloadKind {
        self.payload
    }

    /// Connect signals emitted so far.
    pub fn attempts(&self) -> u32 {
        self.policy.attempts()
    }

    pub fn state(&self) -> &BrokerState {
        &self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == BrokerState::Exhausted
    }

    /// Ask the broker for an identity, retrying on empty answers.
    ///
    /// Returns immediately, without emitting, once the exchange has either
    /// resolved or exhausted its budget.
    pub async fn request_identity(&mut self) -> Result<BrowserIdentity, ConsentError> {
        match &self.state {
            BrokerState::Resolved(identity) => return Ok(identity.clone()),
            BrokerState::Exhausted => return Err(self.exhausted_error()),
            BrokerState::Idle | BrokerState::PendingRetry { .. } => {}
        }

        let mut deadline = self.emit_connect()?;
        loop {
            let outcome = match self.next_response(deadline).await {
                Some(signal) => self.handle_response(&signal),
                None => self.handle_timeout(),
            };

            match outcome {
                ResponseOutcome::Resolved(identity) => return Ok(identity),
                ResponseOutcome::Retry => deadline = self.emit_connect()?,
                ResponseOutcome::Exhausted => return Err(self.exhausted_error()),
                ResponseOutcome::Ignored => continue,
            }
        }
    }

    /// Correlate one `documentCookies` answer with the exchange.
    pub fn handle_response(&mut self, signal: &DataSignal) -> ResponseOutcome {
        let current = match self.state {
            BrokerState::PendingRetry { attempt } => attempt,
            _ => {
                tracing::trace!(attempt = signal.attempt, "broker answer after exchange ended");
                return ResponseOutcome::Ignored;
            }
        };

        if signal.token != self.token {
            return ResponseOutcome::Ignored;
        }

        let kind = signal.payload.kind();
        if kind.is_some() && kind != Some(self.payload) {
            tracing::debug!(
                attempt = signal.attempt,
                kind = ?kind,
                expected = ?self.payload,
                "broker answered with another payload kind"
            );
        } else if let Some(identity) = signal.payload.identity() {
            tracing::debug!(
                attempt = signal.attempt,
                kind = ?signal.payload.kind(),
                "broker resolved identity"
            );
            self.state = BrokerState::Resolved(identity.clone());
            return ResponseOutcome::Resolved(identity);
        }

        if signal.attempt < current {
            tracing::trace!(attempt = signal.attempt, current, "stale empty broker answer");
            return ResponseOutcome::Ignored;
        }

        self.on_empty_answer()
    }

    /// Treat an elapsed response timeout as an empty answer.
    pub fn handle_timeout(&mut self) -> ResponseOutcome {
        if !matches!(self.state, BrokerState::PendingRetry { .. }) {
            return ResponseOutcome::Ignored;
        }
        tracing::debug!(attempt = self.policy.attempts(), "broker answer timed out");
        self.on_empty_answer()
    }

    fn on_empty_answer(&mut self) -> ResponseOutcome {
        if self.policy.can_retry() {
            ResponseOutcome::Retry
        } else {
            tracing::warn!(
                attempts = self.policy.attempts(),
                "cookie broker returned no usable payload"
            );
            self.state = BrokerState::Exhausted;
            ResponseOutcome::Exhausted
        }
    }

    fn emit_connect(&mut self) -> Result<Option<Instant>, ConsentError> {
        let attempt = self.policy.record_attempt();
        self.state = BrokerState::PendingRetry { attempt };
        tracing::debug!(attempt, token = %self.token, "emitting connect signal");

        self.bus.emit(PageEvent::ComponentConnected(ConnectSignal {
            token: self.token.clone(),
            attempt,
        }))?;

        Ok(self.response_timeout.map(|limit| Instant::now() + limit))
    }

    /// Next `documentCookies` signal, or `None` once `deadline` passes.
    ///
    /// The bus sender lives in `self.bus`, so the listener never closes.
    async fn next_response(&mut self, deadline: Option<Instant>) -> Option<DataSignal> {
        loop {
            let received = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.listener.recv()).await {
                        Ok(received) => received,
                        Err(_) => return None,
                    }
                }
                None => self.listener.recv().await,
            };

            match received {
                Ok(PageEvent::DocumentCookies(signal)) => return Some(signal),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "broker listener lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn exhausted_error(&self) -> ConsentError {
        ConsentError::BrokerExhausted {
            attempts: self.policy.attempts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::event::BrokerPayload;

    fn client() -> BrokerClient {
        BrokerClient::new(&PageBus::default(), &BrokerConfig::default())
    }

    fn answer(client: &BrokerClient, attempt: u32, payload: BrokerPayload) -> DataSignal {
        DataSignal {
            token: client.token().clone(),
            attempt,
            payload,
        }
    }

    #[test]
    fn test_answer_before_request_is_ignored() {
        let mut client = client();
        let signal = answer(&client, 1, BrokerPayload::Fingerprint(7));
        assert_eq!(client.handle_response(&signal), ResponseOutcome::Ignored);
        assert_eq!(client.state(), &BrokerState::Idle);
    }

    #[test]
    fn test_foreign_token_is_ignored() {
        let mut client = client();
        client.emit_connect().unwrap();
        let signal = DataSignal {
            token: CorrelationToken::from("someone-else"),
            attempt: 1,
            payload: BrokerPayload::Fingerprint(7),
        };
        assert_eq!(client.handle_response(&signal), ResponseOutcome::Ignored);
    }

    #[test]
    fn test_late_answer_after_resolution_is_ignored() {
        let mut client = client();
        client.emit_connect().unwrap();
        let first = answer(&client, 1, BrokerPayload::Fingerprint(7));
        let late = answer(&client, 1, BrokerPayload::Fingerprint(8));

        assert!(matches!(
            client.handle_response(&first),
            ResponseOutcome::Resolved(_)
        ));
        assert_eq!(client.handle_response(&late), ResponseOutcome::Ignored);
        assert_eq!(
            client.state(),
            &BrokerState::Resolved(BrowserIdentity::new("7").unwrap())
        );
    }

    #[test]
    fn test_stale_empty_answer_is_ignored() {
        let mut client = client();
        client.emit_connect().unwrap();
        client.emit_connect().unwrap();
        let stale = answer(&client, 1, BrokerPayload::Empty);
        assert_eq!(client.handle_response(&stale), ResponseOutcome::Ignored);
    }

    #[test]
    fn test_usable_answer_from_older_attempt_resolves() {
        let mut client = client();
        client.emit_connect().unwrap();
        client.emit_connect().unwrap();
        let older = answer(&client, 1, BrokerPayload::Fingerprint(3));
        assert!(matches!(
            client.handle_response(&older),
            ResponseOutcome::Resolved(_)
        ));
    }

    #[test]
    fn test_other_payload_kind_counts_as_empty() {
        let mut client = client();
        assert_eq!(client.payload_kind(), BrokerPayloadKind::Fingerprint);
        client.emit_connect().unwrap();

        let raw = answer(&client, 1, BrokerPayload::RawCookies("BrowserId=abc".into()));
        assert_eq!(client.handle_response(&raw), ResponseOutcome::Retry);
        assert_eq!(client.state(), &BrokerState::PendingRetry { attempt: 1 });
    }

    #[test]
    fn test_configured_payload_kind_resolves() {
        let config = BrokerConfig {
            payload: BrokerPayloadKind::Token,
            ..BrokerConfig::default()
        };
        let mut client = BrokerClient::new(&PageBus::default(), &config);
        client.emit_connect().unwrap();

        let fingerprint = answer(&client, 1, BrokerPayload::Fingerprint(7));
        assert_eq!(client.handle_response(&fingerprint), ResponseOutcome::Retry);
        let token = answer(&client, 1, BrokerPayload::Token("t".into()));
        assert!(matches!(
            client.handle_response(&token),
            ResponseOutcome::Resolved(_)
        ));
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut client = client();
        for attempt in 1..=5 {
            client.emit_connect().unwrap();
            let empty = answer(&client, attempt, BrokerPayload::Empty);
            assert_eq!(client.handle_response(&empty), ResponseOutcome::Retry);
        }
        client.emit_connect().unwrap();
        let last = answer(&client, 6, BrokerPayload::Empty);
        assert_eq!(client.handle_response(&last), ResponseOutcome::Exhausted);
        assert!(client.is_exhausted());
        assert_eq!(client.attempts(), 6);
    }
}
