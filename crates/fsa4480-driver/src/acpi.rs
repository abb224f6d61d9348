use device_lifecycle::{Correlation, NotificationCallback, NotificationSource};

/// The platform's ACPI device-notification interface for one device.
pub trait AcpiInterface {
    type Error: core::fmt::Debug;

    /// Start delivering `Notify()` events for the device to `callback`.
    fn register_for_device_notifications(
        &self,
        callback: NotificationCallback,
        token: Correlation,
    ) -> Result<(), Self::Error>;

    /// Stop delivering events. The platform reports no failure here.
    fn unregister_for_device_notifications(&self);
}

/// Registration made through [`AcpiNotifications`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcpiRegistration {
    pub device: u32,
}

/// [`NotificationSource`] backed by an [`AcpiInterface`].
pub struct AcpiNotifications<'a, A> {
    acpi: &'a A,
}

impl<'a, A: AcpiInterface> AcpiNotifications<'a, A> {
    pub fn new(acpi: &'a A) -> Self {
        Self { acpi }
    }
}

impl<A: AcpiInterface> NotificationSource for AcpiNotifications<'_, A> {
    type Handle = AcpiRegistration;
    type Error = A::Error;

    fn subscribe(
        &mut self,
        callback: NotificationCallback,
        token: Correlation,
    ) -> Result<AcpiRegistration, A::Error> {
        self.acpi.register_for_device_notifications(callback, token)?;
        Ok(AcpiRegistration { device: token.device() })
    }

    fn unsubscribe(
        &mut self,
        handle: AcpiRegistration,
    ) -> Result<(), A::Error> {
        trace!("device {}: unregistering ACPI notifications", handle.device);
        self.acpi.unregister_for_device_notifications();
        Ok(())
    }
}

/// Notification callback registered for every FSA4480 device.
///
/// Runs on the platform's dispatch context. Events that arrive once the
/// device is no longer subscribed are dropped.
pub fn on_acpi_notify(token: Correlation, code: u32) {
    let Some(_guard) = token.enter() else {
        trace!(
            "device {}: notify {=u32:#x} after teardown, dropped",
            token.device(),
            code
        );
        return;
    };
    info!("device {}: ACPI notify {=u32:#x}", token.device(), code);
}
