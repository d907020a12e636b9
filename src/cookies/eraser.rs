use crate::base::consenterror::ConsentError;
use crate::cookies::access::{CookieAccess, CookieTransport};
use std::sync::Arc;

/// Removes the cookies a visitor did not consent to.
///
/// The transport is fixed when the eraser is built; see
/// [`cookies::access`](crate::cookies::access).
#[derive(Clone)]
pub struct CookieEraser {
    access: Arc<dyn CookieAccess>,
}

impl CookieEraser {
    pub fn new(access: Arc<dyn CookieAccess>) -> Self {
        Self { access }
    }

    pub fn transport(&self) -> CookieTransport {
        self.access.transport()
    }

    /// Invalidate each cookie under every erase path.
    ///
    /// An empty list emits nothing, in either transport.
    pub fn erase(&self, names: &[String]) -> Result<usize, ConsentError> {
        if names.is_empty() {
            tracing::debug!("no cookies to erase");
            return Ok(0);
        }

        let mutations = self.access.expire(names)?;
        tracing::debug!(
            transport = %self.access.transport(),
            count = names.len(),
            mutations,
            "erased cookies"
        );
        Ok(mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::bus::PageBus;
    use crate::broker::event::PageEvent;
    use crate::cookies::access::{DirectCookieAccess, RelayedCookieAccess};
    use crate::cookies::jar::DocumentCookieJar;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_direct_erase_is_path_complete() {
        let jar = Arc::new(DocumentCookieJar::for_location("https://example.com/s/").unwrap());
        jar.write("a=1; Path=/").unwrap();
        jar.write("b=2; Path=/s").unwrap();
        let before = jar.write_count();

        let eraser = CookieEraser::new(Arc::new(DirectCookieAccess::new(jar.clone())));
        assert_eq!(eraser.erase(&names(&["a", "b"])).unwrap(), 4);
        assert_eq!(jar.write_count() - before, 4);
        assert_eq!(jar.cookie_count(), 0);
    }

    #[test]
    fn test_direct_erase_is_idempotent() {
        let jar = Arc::new(DocumentCookieJar::for_location("https://example.com/").unwrap());
        let eraser = CookieEraser::new(Arc::new(DirectCookieAccess::new(jar.clone())));

        assert_eq!(eraser.erase(&names(&["a", "b"])).unwrap(), 4);
        assert_eq!(eraser.erase(&names(&["a", "b"])).unwrap(), 4);
        assert_eq!(jar.write_count(), 8);
    }

    #[test]
    fn test_unparsable_name_does_not_stop_erasure() {
        let jar = Arc::new(DocumentCookieJar::for_location("https://example.com/s/").unwrap());
        jar.write("a=1; Path=/").unwrap();
        jar.write("b=2; Path=/s").unwrap();

        let eraser = CookieEraser::new(Arc::new(DirectCookieAccess::new(jar.clone())));
        assert_eq!(eraser.erase(&names(&["a", "", "b"])).unwrap(), 4);
        assert!(!jar.contains("a", "/"));
        assert!(!jar.contains("b", "/s"));
    }

    #[test]
    fn test_empty_erase_is_noop() {
        let jar = Arc::new(DocumentCookieJar::for_location("https://example.com/").unwrap());
        let eraser = CookieEraser::new(Arc::new(DirectCookieAccess::new(jar.clone())));
        assert_eq!(eraser.erase(&[]).unwrap(), 0);
        assert_eq!(jar.write_count(), 0);
    }

    #[test]
    fn test_relayed_erase_emits_delete_signal() {
        let bus = PageBus::default();
        let mut rx = bus.subscribe();
        let eraser = CookieEraser::new(Arc::new(RelayedCookieAccess::new(bus)));

        assert_eq!(eraser.transport(), CookieTransport::Relayed);
        assert_eq!(eraser.erase(&names(&["a", "b"])).unwrap(), 0);

        match rx.try_recv().unwrap() {
            PageEvent::DeleteCookies(list) => assert_eq!(list, names(&["a", "b"])),
            other => panic!("Expected DeleteCookies, got {other:?}"),
        }
    }

    #[test]
    fn test_relayed_erase_without_broker_fails() {
        let eraser = CookieEraser::new(Arc::new(RelayedCookieAccess::new(PageBus::default())));
        assert_eq!(
            eraser.erase(&names(&["a"])),
            Err(ConsentError::PageBusUnavailable)
        );
    }
}
