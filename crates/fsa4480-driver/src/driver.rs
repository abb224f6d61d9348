use core::fmt;

use device_lifecycle::{
    activate, deactivate, DeviceContext, Liveness, TeardownReport,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c};
use heapless::Vec;

use crate::acpi::{on_acpi_notify, AcpiInterface, AcpiNotifications};
use crate::transport::{I2cTransport, TransportError};
use crate::DEFAULT_STATE;

/// Lifecycle context of one FSA4480 device.
pub type Fsa4480Context<'a, I2C, D, A> =
    DeviceContext<I2cTransport<I2C, D>, AcpiNotifications<'a, A>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<E, AE> {
    /// A device with this id has already been added.
    DuplicateDevice(u32),
    /// No device with this id has been added.
    UnknownDevice(u32),
    /// Device table or liveness pool is full.
    NoFreeSlot,
    /// Bring-up failed; nothing is held for the device.
    Activation(device_lifecycle::Error<TransportError<E>, AE>),
}

/// A refused [`Fsa4480Driver::device_add`].
///
/// Carries the transport back to the caller so bring-up can be retried on
/// the same bus.
pub struct AddRefused<I2C, D, E> {
    pub error: E,
    pub transport: I2cTransport<I2C, D>,
}

impl<I2C, D, E> AddRefused<I2C, D, E> {
    fn new(error: E, transport: I2cTransport<I2C, D>) -> Self {
        Self { error, transport }
    }
}

impl<I2C, D, E: fmt::Debug> fmt::Debug for AddRefused<I2C, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddRefused")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

type AddResult<I2C, D, A> = Result<
    (),
    AddRefused<
        I2C,
        D,
        DriverError<<I2C as ErrorType>::Error, <A as AcpiInterface>::Error>,
    >,
>;

/// A tracked device and the pool slot its [`Liveness`] came from.
struct Entry<'a, I2C, D, A>
where
    I2C: I2c,
    D: DelayNs,
    A: AcpiInterface,
{
    slot: usize,
    ctx: Fsa4480Context<'a, I2C, D, A>,
}

/// Driver-wide state: the table of devices the framework has added.
///
/// Each present device holds one [`Liveness`] from the pool passed to
/// [`new`](Self::new); removal frees it for the next arrival. At most `N`
/// devices are tracked at once.
pub struct Fsa4480Driver<'a, I2C, D, A, const N: usize>
where
    I2C: I2c,
    D: DelayNs,
    A: AcpiInterface,
{
    liveness: &'static [Liveness],
    devices: Vec<Entry<'a, I2C, D, A>, N>,
}

impl<'a, I2C, D, A, const N: usize> Fsa4480Driver<'a, I2C, D, A, N>
where
    I2C: I2c,
    D: DelayNs,
    A: AcpiInterface,
{
    pub fn new(liveness: &'static [Liveness]) -> Self {
        Self { liveness, devices: Vec::new() }
    }

    /// Device arrival: create the device's context and bring it up.
    ///
    /// On refusal the transport is handed back untouched by any open
    /// session.
    pub fn device_add(
        &mut self,
        id: u32,
        transport: I2cTransport<I2C, D>,
        address: u8,
        acpi: &'a A,
    ) -> AddResult<I2C, D, A> {
        info!("device_add {}: entry", id);

        if self.device(id).is_some() {
            error!("device_add {}: already present", id);
            return Err(AddRefused::new(
                DriverError::DuplicateDevice(id),
                transport,
            ));
        }
        let Some((slot, liveness)) = self.free_slot() else {
            error!("device_add {}: no free slot", id);
            return Err(AddRefused::new(DriverError::NoFreeSlot, transport));
        };

        let mut ctx = DeviceContext::new(
            id,
            transport,
            on_acpi_notify,
            liveness,
            &DEFAULT_STATE,
        );
        let source = AcpiNotifications::new(acpi);
        if let Err(e) = activate(&mut ctx, address, source) {
            return Err(AddRefused::new(
                DriverError::Activation(e),
                ctx.into_transport(),
            ));
        }

        if let Err(entry) = self.devices.push(Entry { slot, ctx }) {
            return Err(AddRefused::new(
                DriverError::NoFreeSlot,
                entry.ctx.into_transport(),
            ));
        }

        info!("device_add {}: exit, slot {}", id, slot);
        Ok(())
    }

    /// Device removal: tear the device down and drop it from the table.
    ///
    /// Returns the teardown report and the device's transport.
    pub fn device_remove(
        &mut self,
        id: u32,
    ) -> Result<
        (TeardownReport, I2cTransport<I2C, D>),
        DriverError<I2C::Error, A::Error>,
    > {
        info!("device_remove {}: entry", id);
        let Some(pos) = self.devices.iter().position(|e| e.ctx.device() == id)
        else {
            error!("device_remove {}: unknown device", id);
            return Err(DriverError::UnknownDevice(id));
        };
        let mut entry = self.devices.swap_remove(pos);
        let report = deactivate(&mut entry.ctx);
        if !report.is_clean() {
            warn!("device_remove {}: teardown incomplete: {:?}", id, report);
        }
        info!("device_remove {}: exit, slot {} free", id, entry.slot);
        Ok((report, entry.ctx.into_transport()))
    }

    /// Driver unload: tear down every device still present and forget them.
    ///
    /// Returns how many devices still held resources at this point.
    pub fn unload(&mut self) -> usize {
        info!("unload: entry, {} device(s)", self.devices.len());
        let mut held = 0;
        for entry in self.devices.iter_mut() {
            let report = deactivate(&mut entry.ctx);
            if !report.is_noop() {
                let id = entry.ctx.device();
                warn!("unload: device {} was still active", id);
                held += 1;
            }
        }
        self.devices.clear();
        info!("unload: exit");
        held
    }

    pub fn device(&self, id: u32) -> Option<&Fsa4480Context<'a, I2C, D, A>> {
        self.devices
            .iter()
            .find(|e| e.ctx.device() == id)
            .map(|e| &e.ctx)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Lowest pool slot no present device uses.
    fn free_slot(&self) -> Option<(usize, &'static Liveness)> {
        if self.devices.is_full() {
            return None;
        }
        let pool: &'static [Liveness] = self.liveness;
        pool.iter()
            .enumerate()
            .find(|(slot, _)| !self.devices.iter().any(|e| e.slot == *slot))
    }
}
