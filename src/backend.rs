//! Rendering collaborator boundary.
//!
//! A [`RenderingBackend`] turns a URL into an open [`PageSession`]; the
//! session hands back a [`RenderedDom`] and must be closed to release the
//! browser (or connection) behind it. [`SessionGuard`] makes sure that close
//! happens exactly once on every exit path.

use log::{debug, warn};

use crate::dom::RenderedDom;
use crate::Result;

/// Opens rendering sessions for URLs.
pub trait RenderingBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Navigate to `url` and wait until the page is ready for capture.
    ///
    /// Implementations must release anything they acquired before returning
    /// an error.
    fn open(&self, url: &str) -> Result<Box<dyn PageSession>>;
}

/// A loaded page.
pub trait PageSession: Send {
    /// Capture the rendered DOM with computed styles.
    fn capture(&mut self) -> Result<RenderedDom>;

    /// Release the session.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Owns an open session and closes it exactly once.
///
/// Call [`SessionGuard::close`] on the normal path; if the guard is dropped
/// while still holding a session (early return, panic) the drop closes it.
pub struct SessionGuard {
    session: Option<Box<dyn PageSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn PageSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn capture(&mut self) -> Result<RenderedDom> {
        match self.session.as_mut() {
            Some(s) => s.capture(),
            None => Err(crate::Error::RenderError("Session already closed".into())),
        }
    }

    /// Close the session now. Later calls (and the drop) are no-ops.
    pub fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(s) => {
                debug!("Closing rendering session");
                s.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close rendering session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSession {
        closes: Arc<AtomicUsize>,
    }

    impl PageSession for CountingSession {
        fn capture(&mut self) -> Result<RenderedDom> {
            Ok(RenderedDom::new("t", "u"))
        }

        fn close(self: Box<Self>) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn explicit_close_then_drop_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        {
            let mut guard = SessionGuard::new(Box::new(CountingSession { closes: closes.clone() }));
            guard.capture().unwrap();
            guard.close().unwrap();
            assert!(guard.capture().is_err());
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_alone_closes() {
        let closes = Arc::new(AtomicUsize::new(0));
        drop(SessionGuard::new(Box::new(CountingSession { closes: closes.clone() })));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
