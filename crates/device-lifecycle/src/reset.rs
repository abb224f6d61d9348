use crate::bus::BusTransport;
use crate::error::ResetError;

/// One (register, value) pair of a fixed write sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterWrite {
    pub register: u8,
    pub value: u8,
}

impl RegisterWrite {
    pub const fn new(register: u8, value: u8) -> Self {
        Self { register, value }
    }
}

/// Return the chip to its default state by replaying `sequence` in order.
///
/// Stops at the first failed write; the error names that write.
pub fn reset_to_default<B: BusTransport>(
    transport: &mut B,
    session: &mut B::Session,
    sequence: &[RegisterWrite],
) -> Result<(), ResetError<B::Error>> {
    for &write in sequence {
        transport
            .write_register(session, write.register, write.value)
            .map_err(|source| ResetError { write, source })?;
    }
    Ok(())
}
