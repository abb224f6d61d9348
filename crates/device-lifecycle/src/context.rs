use crate::bus::BusTransport;
use crate::controller::deactivate;
use crate::notify::{
    Correlation, Liveness, NotificationCallback, NotificationSource,
};
use crate::reset::RegisterWrite;

/// Phase of a device's resource lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Nothing held; [`activate`](crate::activate) may run.
    Created,
    /// Acquisition in progress.
    Activating,
    /// Bus session open and notifications subscribed.
    Active,
    /// Teardown in progress.
    Deactivating,
    /// Torn down for good.
    Inactive,
}

/// A live registration together with the source it was made against.
pub(crate) struct Subscription<N: NotificationSource> {
    pub(crate) source: N,
    pub(crate) handle: N::Handle,
}

/// Per-device lifecycle state.
///
/// Owned by the host framework for the whole life of the device and lent to
/// [`activate`](crate::activate) / [`deactivate`](crate::deactivate) by
/// mutable reference, which serializes lifecycle calls for one device.
pub struct DeviceContext<B: BusTransport, N: NotificationSource> {
    pub(crate) transport: B,
    pub(crate) session: Option<B::Session>,
    pub(crate) subscription: Option<Subscription<N>>,
    pub(crate) callback: NotificationCallback,
    pub(crate) token: Correlation,
    pub(crate) defaults: &'static [RegisterWrite],
    pub(crate) phase: Phase,
}

impl<B: BusTransport, N: NotificationSource> DeviceContext<B, N> {
    /// Create a context in [`Phase::Created`].
    ///
    /// `liveness` must not be shared with another live context; it is
    /// disarmed here in case it was recycled from a previous device.
    pub fn new(
        device: u32,
        transport: B,
        callback: NotificationCallback,
        liveness: &'static Liveness,
        defaults: &'static [RegisterWrite],
    ) -> Self {
        liveness.disarm();
        Self {
            transport,
            session: None,
            subscription: None,
            callback,
            token: Correlation::new(device, liveness),
            defaults,
            phase: Phase::Created,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn device(&self) -> u32 {
        self.token.device()
    }

    /// Token handed to the notification source on subscription.
    pub fn token(&self) -> Correlation {
        self.token
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a notification registration is currently held.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Registration handle of the current subscription, if any.
    pub fn notification_handle(&self) -> Option<&N::Handle> {
        self.subscription.as_ref().map(|s| &s.handle)
    }

    /// Default-state write sequence replayed on teardown.
    pub fn defaults(&self) -> &'static [RegisterWrite] {
        self.defaults
    }

    pub fn transport(&self) -> &B {
        &self.transport
    }

    /// Tear down whatever is still held and give the transport back.
    ///
    /// After a failed [`activate`](crate::activate) or a completed
    /// [`deactivate`] this releases nothing further.
    pub fn into_transport(mut self) -> B {
        let _ = deactivate(&mut self);
        self.transport
    }

    /// Run `f` against the open session, if there is one.
    pub fn with_session<R>(
        &mut self,
        f: impl FnOnce(&mut B, &mut B::Session) -> R,
    ) -> Option<R> {
        let session = self.session.as_mut()?;
        Some(f(&mut self.transport, session))
    }
}
