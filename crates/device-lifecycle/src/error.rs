use crate::context::Phase;
use crate::reset::RegisterWrite;

/// Errors surfaced by [`activate`](crate::activate).
///
/// Teardown never returns these; see [`TeardownReport`](crate::TeardownReport).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<BusE, NotifyE> {
    /// The bus session could not be opened.
    TransportUnavailable(BusE),
    /// A register transaction failed.
    TransportError(BusE),
    /// Registration with the notification source failed. The bus session
    /// opened in the same call has already been closed.
    SubscriptionFailed(NotifyE),
    /// The context is not in a phase that allows the operation.
    InvalidPhase(Phase),
}

impl<BusE, NotifyE> core::fmt::Display for Error<BusE, NotifyE>
where
    BusE: core::fmt::Debug,
    NotifyE: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::TransportUnavailable(e) => {
                write!(f, "bus transport unavailable: {:?}", e)
            }
            Error::TransportError(e) => {
                write!(f, "bus transaction failed: {:?}", e)
            }
            Error::SubscriptionFailed(e) => {
                write!(f, "notification subscription failed: {:?}", e)
            }
            Error::InvalidPhase(phase) => {
                write!(f, "operation not allowed in phase {:?}", phase)
            }
        }
    }
}

/// A default-state write that the transport rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetError<BusE> {
    /// The write that failed; later writes of the sequence were not issued.
    pub write: RegisterWrite,
    pub source: BusE,
}

impl<BusE, NotifyE> From<ResetError<BusE>> for Error<BusE, NotifyE> {
    fn from(e: ResetError<BusE>) -> Self {
        Error::TransportError(e.source)
    }
}
