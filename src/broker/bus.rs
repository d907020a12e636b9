use crate::base::consenterror::ConsentError;
use crate::broker::event::PageEvent;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// The page-scoped event bus shared by the widget and the host broker.
///
/// Every subscriber sees every signal, including the ones it emitted
/// itself, in emission order.
#[derive(Clone)]
pub struct PageBus {
    sender: broadcast::Sender<PageEvent>,
}

impl Default for PageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PageBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Dispatch a signal to every listener. Fails when nobody listens.
    pub fn emit(&self, event: PageEvent) -> Result<usize, ConsentError> {
        let name = event.name();
        self.sender.send(event).map_err(|_| {
            tracing::debug!(event = name, "page event dropped, no listeners");
            ConsentError::PageBusUnavailable
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for PageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
