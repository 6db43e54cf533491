// Failure-isolating supervisor for one render pass

use crate::error::RenderError;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

/// Identity of a render guard; every pass gets a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GuardId(pub u64);

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "guard#{}", self.0)
    }
}

/// Runs tree construction so that errors, and panics, become a failed
/// render instead of reaching the host
#[derive(Debug)]
pub struct RenderGuard {
    id: GuardId,
}

impl RenderGuard {
    pub fn new(id: GuardId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> GuardId {
        self.id
    }

    /// Run `build`; a guard supervises exactly one pass
    pub fn run<T>(self, build: impl FnOnce() -> Result<T, RenderError>) -> Result<T, RenderError> {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(build)) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "render panicked".to_string());
                error!(guard = %self.id, %message, "render pass panicked");
                Err(RenderError::new("InternalError", message))
            }
        };
        match &outcome {
            Ok(_) => debug!(guard = %self.id, "render pass completed"),
            Err(err) => debug!(guard = %self.id, error = %err, "render pass failed"),
        }
        outcome
    }
}

/// Routes panic reports to `tracing` while alive. A contained render panic
/// would otherwise be printed over a full-screen terminal session.
#[must_use = "the hook is removed when this is dropped"]
#[derive(Debug)]
pub struct TracingPanicHook {
    _installed: (),
}

impl TracingPanicHook {
    pub fn install() -> Self {
        panic::set_hook(Box::new(|info| {
            error!(panic = %info, "panic");
        }));
        Self { _installed: () }
    }
}

impl Drop for TracingPanicHook {
    fn drop(&mut self) {
        // back to the default stderr hook
        drop(panic::take_hook());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_success() {
        let guard = RenderGuard::new(GuardId(1));
        assert_eq!(guard.id().to_string(), "guard#1");
        assert_eq!(guard.run(|| Ok(3)), Ok(3));
    }

    #[test]
    fn test_error_is_returned() {
        let guard = RenderGuard::new(GuardId(2));
        let err = RenderError::new("Error", "nope");
        assert_eq!(guard.run::<()>(|| Err(err.clone())), Err(err));
    }

    #[test]
    fn test_panic_is_contained() {
        let result = RenderGuard::new(GuardId(3)).run::<()>(|| panic!("layout bug"));
        assert_eq!(result.unwrap_err().to_string(), "InternalError: layout bug");

        let formatted = RenderGuard::new(GuardId(4)).run::<()>(|| panic!("bad index {}", 7));
        assert_eq!(formatted.unwrap_err().to_string(), "InternalError: bad index 7");
    }

    #[test]
    fn test_hook_reports_contained_panic_through_tracing() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let hook = TracingPanicHook::install();
            let result = RenderGuard::new(GuardId(5)).run::<()>(|| panic!("kept off the screen"));
            drop(hook);
            assert_eq!(result.unwrap_err().to_string(), "InternalError: kept off the screen");
        });

        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("ERROR"));
        assert!(logged.contains("kept off the screen"));
        assert!(logged.contains("guard#5"));
    }
}
