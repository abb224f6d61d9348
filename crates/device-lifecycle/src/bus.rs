use crate::controller::StepOutcome;

/// Register-level access to a chip over a serial bus.
///
/// Implementors decide what "opening" a target means (claiming a bus,
/// probing the chip, opening an I/O target). The session returned by
/// [`open`](Self::open) represents exclusive ownership of that target and is
/// only ever held by one [`DeviceContext`](crate::DeviceContext).
pub trait BusTransport {
    /// Bus address of the target (e.g. a 7-bit I2C address).
    type Address: Copy + core::fmt::Debug;
    /// Open channel to the target.
    type Session;
    /// Error type for transport failures (timeout, NACK, bus unavailable).
    type Error: core::fmt::Debug;

    /// Open a session against the target at `address`.
    fn open(
        &mut self,
        address: Self::Address,
    ) -> Result<Self::Session, Self::Error>;

    /// Release a session.
    ///
    /// The session is consumed whatever the result; an error only reports
    /// that the underlying release did not go cleanly.
    fn close(&mut self, session: Self::Session) -> Result<(), Self::Error>;

    /// Write a single register on the target.
    fn write_register(
        &mut self,
        session: &mut Self::Session,
        register: u8,
        value: u8,
    ) -> Result<(), Self::Error>;
}

/// Close `session`, logging a failed release instead of returning it.
pub(crate) fn close_logged<B: BusTransport>(
    transport: &mut B,
    session: B::Session,
) -> StepOutcome {
    match transport.close(session) {
        Ok(()) => {
            trace!("bus session closed");
            StepOutcome::Completed
        }
        Err(e) => {
            warn!("bus session release failed: {:?}", crate::fmt::dbg(&e));
            StepOutcome::Failed
        }
    }
}
