#![no_std]
//! Device driver glue for the FSA4480 accessory switch.
//!
//! Binds the generic [`device_lifecycle`] state machine to the chip driver
//! over I2C and to the platform's ACPI notification interface, and exposes
//! the entry points a host device framework calls on device arrival,
//! removal and driver unload.

mod fmt;

mod acpi;
mod driver;
mod transport;

pub use acpi::{
    on_acpi_notify, AcpiInterface, AcpiNotifications, AcpiRegistration,
};
pub use driver::{AddRefused, DriverError, Fsa4480Context, Fsa4480Driver};
pub use transport::{I2cTransport, TransportError};

use device_lifecycle::RegisterWrite;
use fsa4480::{Register, SwitchEnable, SwitchSelect};

/// Default-state write sequence replayed when a device is torn down.
///
/// Same steps as [`fsa4480::Fsa4480::update_settings`] with the power-on
/// USB routing: open every path, select USB, close the USB path. The
/// transport inserts the settle delay after the control write.
pub const DEFAULT_STATE: [RegisterWrite; 3] = [
    RegisterWrite::new(
        Register::SwitchSettings as u8,
        SwitchEnable::ALL_OPEN.bits(),
    ),
    RegisterWrite::new(
        Register::SwitchControl as u8,
        SwitchSelect::USB_MODE.bits(),
    ),
    RegisterWrite::new(
        Register::SwitchSettings as u8,
        SwitchEnable::USB_MODE.bits(),
    ),
];
