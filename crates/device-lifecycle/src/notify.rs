use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::controller::StepOutcome;

/// Callback the platform invokes on its own execution context.
///
/// Receives the correlation token handed over at subscription time and the
/// platform-defined notify code. It may run concurrently with teardown, so it
/// must call [`Correlation::enter`] before touching the device.
pub type NotificationCallback = fn(token: Correlation, code: u32);

/// A platform-provided source of asynchronous device notifications.
pub trait NotificationSource {
    /// Opaque registration token returned by the platform.
    type Handle;
    /// Error type for registration failures.
    type Error: core::fmt::Debug;

    /// Register `callback` for notifications about the device `token` names.
    fn subscribe(
        &mut self,
        callback: NotificationCallback,
        token: Correlation,
    ) -> Result<Self::Handle, Self::Error>;

    /// Cancel a registration.
    ///
    /// After this returns no new callback invocation begins; one already in
    /// flight may still be running.
    fn unsubscribe(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;
}

/// Subscription liveness shared between a context and its callback.
///
/// The context arms the flag right before subscribing and disarms it right
/// before unsubscribing. Callbacks check it through [`Liveness::enter`],
/// which also keeps a count of invocations currently running.
#[derive(Debug)]
pub struct Liveness {
    live: AtomicBool,
    in_flight: AtomicUsize,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub const fn new() -> Self {
        Self {
            live: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Enter the device from a callback.
    ///
    /// Returns `None` once the subscription has been torn down. The returned
    /// guard counts as in flight until it is dropped.
    pub fn enter(&self) -> Option<LiveGuard<'_>> {
        // Count first so a concurrent disarm observes us in `in_flight`.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.live.load(Ordering::SeqCst) {
            Some(LiveGuard { liveness: self })
        } else {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            None
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of callback invocations currently holding a [`LiveGuard`].
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn arm(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    pub(crate) fn disarm(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// RAII proof that the subscription was live when a callback entered.
///
/// Dropping the guard decrements the in-flight count. Holding it does not
/// keep the bus session open; teardown never waits for guards.
pub struct LiveGuard<'a> {
    liveness: &'a Liveness,
}

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.liveness.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Correlation token handed to the platform along with the callback.
#[derive(Debug, Clone, Copy)]
pub struct Correlation {
    device: u32,
    liveness: &'static Liveness,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Correlation {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Correlation {{ device: {}, live: {} }}",
            self.device,
            self.liveness.is_live()
        )
    }
}

impl Correlation {
    pub const fn new(device: u32, liveness: &'static Liveness) -> Self {
        Self { device, liveness }
    }

    /// Framework-assigned identifier of the device.
    pub fn device(&self) -> u32 {
        self.device
    }

    pub fn liveness(&self) -> &'static Liveness {
        self.liveness
    }

    /// Shorthand for `self.liveness().enter()`.
    pub fn enter(&self) -> Option<LiveGuard<'static>> {
        self.liveness.enter()
    }
}

/// Cancel a registration, logging a failure instead of returning it.
pub(crate) fn unsubscribe_logged<N: NotificationSource>(
    source: &mut N,
    handle: N::Handle,
) -> StepOutcome {
    match source.unsubscribe(handle) {
        Ok(()) => {
            trace!("notification subscription cancelled");
            StepOutcome::Completed
        }
        Err(e) => {
            warn!("unsubscribe failed: {:?}", crate::fmt::dbg(&e));
            StepOutcome::Failed
        }
    }
}
