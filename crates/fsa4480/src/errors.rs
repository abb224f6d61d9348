use crate::registers::Register;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<I2cE> {
    I2c(I2cE),
    /// Address does not name a register of the chip.
    InvalidRegister(u8),
    /// Write attempted on a status or ID register.
    ReadOnly(Register),
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(err) => write!(f, "I2C communication error: {:?}", err),
            Error::InvalidRegister(addr) => {
                write!(f, "No register at address {:#04x}", addr)
            }
            Error::ReadOnly(reg) => {
                write!(f, "Register {:?} is read-only", reg)
            }
        }
    }
}
