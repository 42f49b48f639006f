//! Ctrl-C handling while a foreground child runs.
//!
//! The terminal delivers SIGINT to the whole foreground process group,
//! so the child sees it directly. The parent only records that it
//! happened and reports the interruption once the child is gone.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Scoped SIGINT handler that records interrupts instead of exiting.
///
/// The previous disposition is restored on drop.
pub struct InterruptGuard {
    #[cfg(unix)]
    previous: libc::sigaction,
}

#[cfg(unix)]
extern "C" fn record_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

impl InterruptGuard {
    /// Install the handler and clear any earlier interrupt.
    #[cfg(unix)]
    pub fn install() -> Self {
        INTERRUPTED.store(false, Ordering::SeqCst);

        // SAFETY: both sigaction structs are fully initialized before
        // use, and the handler only touches an atomic.
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = record_interrupt as extern "C" fn(libc::c_int) as usize;
            action.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&mut action.sa_mask);

            let mut previous: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(libc::SIGINT, &action, &mut previous) != 0 {
                tracing::debug!(
                    "Failed to install SIGINT handler: {}",
                    std::io::Error::last_os_error()
                );
            }
            Self { previous }
        }
    }

    /// Install the handler and clear any earlier interrupt.
    #[cfg(not(unix))]
    pub fn install() -> Self {
        INTERRUPTED.store(false, Ordering::SeqCst);
        Self {}
    }

    /// Whether SIGINT arrived since [`install`](Self::install).
    pub fn interrupted(&self) -> bool {
        INTERRUPTED.load(Ordering::SeqCst)
    }
}

impl Drop for InterruptGuard {
    #[cfg(unix)]
    fn drop(&mut self) {
        // SAFETY: `previous` was filled in by sigaction in `install`.
        unsafe {
            libc::sigaction(libc::SIGINT, &self.previous, std::ptr::null_mut());
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {}
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn records_sigint_without_exiting() {
        let guard = InterruptGuard::install();
        assert!(!guard.interrupted());

        // SAFETY: raise(3) delivers to this process, which has a handler.
        unsafe {
            libc::raise(libc::SIGINT);
        }
        assert!(guard.interrupted());
    }

    #[test]
    #[serial]
    fn install_clears_previous_interrupt() {
        {
            let _guard = InterruptGuard::install();
            unsafe {
                libc::raise(libc::SIGINT);
            }
        }
        let guard = InterruptGuard::install();
        assert!(!guard.interrupted());
    }
}
