//! Host-page side of the broker protocol.
//!
//! The sandboxed widget cannot read `document.cookie`; this broker runs
//! with full document access, answers `componentConnected` with the payload
//! of its configured variant and performs `deleteCookies` requests.

use crate::base::consenterror::ConsentError;
use crate::broker::bus::PageBus;
use crate::broker::event::{BrokerPayload, BrokerPayloadKind, ConnectSignal, DataSignal, PageEvent};
use crate::broker::fingerprint::DeviceTraits;
use crate::cookies::access::{CookieAccess, DirectCookieAccess};
use crate::cookies::jar::DocumentCookieJar;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

pub struct CookieBroker {
    bus: PageBus,
    access: DirectCookieAccess,
    payload: BrokerPayloadKind,
    device: DeviceTraits,
}

impl CookieBroker {
    pub fn new(bus: PageBus, jar: Arc<DocumentCookieJar>, payload: BrokerPayloadKind) -> Self {
        Self {
            bus,
            access: DirectCookieAccess::new(jar),
            payload,
            device: DeviceTraits::default(),
        }
    }

    pub fn with_device(mut self, device: DeviceTraits) -> Self {
        self.device = device;
        self
    }

    /// Compute the answer to a connect signal.
    pub fn respond(&self, connect: &ConnectSignal) -> DataSignal {
        let payload = match self.payload {
            BrokerPayloadKind::Token => BrokerPayload::Token(connect.token.to_string()),
            BrokerPayloadKind::Fingerprint => BrokerPayload::Fingerprint(self.device.fingerprint()),
            BrokerPayloadKind::RawCookies => {
                let raw = self.access.jar().read_all();
                if raw.is_empty() {
                    BrokerPayload::Empty
                } else {
                    BrokerPayload::RawCookies(raw)
                }
            }
        };
        DataSignal::reply(connect, payload)
    }

    /// React to one page signal. Data signals, including our own, are ignored.
    pub fn handle(&self, event: &PageEvent) -> Result<(), ConsentError> {
        match event {
            PageEvent::ComponentConnected(connect) => {
                let reply = self.respond(connect);
                tracing::debug!(
                    attempt = connect.attempt,
                    kind = ?reply.payload.kind(),
                    "broker answering connect"
                );
                self.bus.emit(PageEvent::DocumentCookies(reply))?;
            }
            PageEvent::DeleteCookies(names) => {
                let mutations = self.access.expire(names)?;
                tracing::debug!(count = names.len(), mutations, "broker expired cookies");
            }
            PageEvent::DocumentCookies(_) => {}
        }
        Ok(())
    }

    /// Start listening on the page bus.
    ///
    /// The subscription is taken before this returns, so no signal emitted
    /// afterwards can be missed.
    pub fn spawn(self) -> BrokerHandle {
        let mut rx = self.bus.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = self.handle(&event) {
                            tracing::warn!(event = event.name(), error = %e, "broker failed to handle signal");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "broker lagged behind page bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        BrokerHandle { task }
    }
}

/// Running broker task; stops when dropped.
pub struct BrokerHandle {
    task: JoinHandle<()>,
}

impl BrokerHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for BrokerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
