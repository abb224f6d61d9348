use device_lifecycle::BusTransport;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use fsa4480::{Fsa4480, Register, SETTLE_US};

/// Errors from the I2C transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
    /// The bus is already claimed by an open session.
    Busy,
    Chip(fsa4480::Error<E>),
}

/// [`BusTransport`] over an exclusively owned I2C bus.
///
/// Opening a session moves the bus into a [`Fsa4480`] driver and probes the
/// chip; closing it moves the bus back.
pub struct I2cTransport<I2C, D> {
    bus: Option<I2C>,
    delay: D,
}

impl<I2C, D> I2cTransport<I2C, D> {
    pub fn new(bus: I2C, delay: D) -> Self {
        Self { bus: Some(bus), delay }
    }

    /// `true` while no session holds the bus.
    pub fn is_idle(&self) -> bool {
        self.bus.is_some()
    }
}

impl<I2C: I2c, D: DelayNs> BusTransport for I2cTransport<I2C, D> {
    type Address = u8;
    type Session = Fsa4480<I2C>;
    type Error = TransportError<I2C::Error>;

    fn open(&mut self, address: u8) -> Result<Fsa4480<I2C>, Self::Error> {
        let bus = self.bus.take().ok_or(TransportError::Busy)?;
        let mut chip = Fsa4480::new(bus, address);
        match chip.device_id() {
            Ok(id) => {
                debug!("fsa4480 at {=u8:#x}: device id {=u8:#x}", address, id);
                Ok(chip)
            }
            Err(e) => {
                self.bus = Some(chip.release());
                Err(e.into())
            }
        }
    }

    fn close(&mut self, session: Fsa4480<I2C>) -> Result<(), Self::Error> {
        if self.bus.is_some() {
            return Err(TransportError::Busy);
        }
        self.bus = Some(session.release());
        Ok(())
    }

    fn write_register(
        &mut self,
        session: &mut Fsa4480<I2C>,
        register: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        session.write_raw(register, value)?;
        if register == Register::SwitchControl as u8 {
            self.delay.delay_us(SETTLE_US);
        }
        Ok(())
    }
}
