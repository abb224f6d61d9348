#![no_std]
//! Register-level driver for the onsemi FSA4480 USB Type-C analog audio
//! switch, over a blocking `embedded-hal` I2C bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

pub use crate::errors::Error;
pub use crate::registers::*;

pub mod errors;
pub mod registers;

/// 7-bit address with the ADDR pin low.
pub const DEFAULT_ADDRESS: u8 = 0x42;
/// 7-bit address with the ADDR pin high.
pub const ALT_ADDRESS: u8 = 0x43;

/// Time the switches need between a control write and re-enabling them.
pub const SETTLE_US: u32 = 50;

pub struct Fsa4480<I2C> {
    i2c: I2C,
    address: u8,
}

impl<E, I2C> Fsa4480<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn read_register(&mut self, reg: Register) -> Result<u8, Error<E>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[u8::from(reg)], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    pub fn write_register(
        &mut self,
        reg: Register,
        val: u8,
    ) -> Result<(), Error<E>> {
        if reg.is_read_only() {
            return Err(Error::ReadOnly(reg));
        }
        self.i2c
            .write(self.address, &[u8::from(reg), val])
            .map_err(Error::I2c)
    }

    /// Write a register given by its raw address.
    pub fn write_raw(&mut self, addr: u8, val: u8) -> Result<(), Error<E>> {
        let reg = Register::try_from(addr)
            .map_err(|e| Error::InvalidRegister(e.number))?;
        self.write_register(reg, val)
    }

    pub fn modify_register<F>(
        &mut self,
        reg: Register,
        f: F,
    ) -> Result<(), Error<E>>
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read_register(reg)?;
        self.write_register(reg, f(value))
    }

    /// Read the device ID register. Also serves as a presence check.
    pub fn device_id(&mut self) -> Result<u8, Error<E>> {
        self.read_register(Register::DeviceId)
    }

    pub fn switch_settings(&mut self) -> Result<SwitchEnable, Error<E>> {
        self.read_register(Register::SwitchSettings)
            .map(SwitchEnable::from_bits_retain)
    }

    pub fn switch_control(&mut self) -> Result<SwitchSelect, Error<E>> {
        self.read_register(Register::SwitchControl)
            .map(SwitchSelect::from_bits_retain)
    }

    pub fn switch_status(&mut self) -> Result<SwitchStatus, Error<E>> {
        let status0 = self.read_register(Register::SwitchStatus0)?;
        let status1 = self.read_register(Register::SwitchStatus1)?;
        Ok(SwitchStatus { status0, status1 })
    }

    /// Change the switch routing.
    ///
    /// Opens every path, writes the new selection, waits for the switches
    /// to settle, then applies the new enables.
    pub fn update_settings<D: DelayNs>(
        &mut self,
        delay: &mut D,
        select: SwitchSelect,
        enable: SwitchEnable,
    ) -> Result<(), Error<E>> {
        self.write_register(
            Register::SwitchSettings,
            SwitchEnable::ALL_OPEN.bits(),
        )?;
        self.write_register(Register::SwitchControl, select.bits())?;
        delay.delay_us(SETTLE_US);
        self.write_register(Register::SwitchSettings, enable.bits())
    }

    /// Restore every register to its power-on value.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_register(Register::Reset, RESET_ALL)
    }
}
