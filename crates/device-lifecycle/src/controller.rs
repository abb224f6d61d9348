use crate::bus::{close_logged, BusTransport};
use crate::context::{DeviceContext, Phase, Subscription};
use crate::error::Error;
use crate::notify::{unsubscribe_logged, NotificationSource};
use crate::reset::reset_to_default;

/// What happened to one teardown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// Nothing to release for this step.
    #[default]
    Skipped,
    Completed,
    /// Attempted and failed; the failure was logged.
    Failed,
}

/// Per-step record of a [`deactivate`] call.
///
/// Diagnostic only: teardown has no failure return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TeardownReport {
    /// Default-state register writes.
    pub reset: StepOutcome,
    /// Cancelling the notification subscription.
    pub unsubscribe: StepOutcome,
    /// Closing the bus session.
    pub close: StepOutcome,
}

impl TeardownReport {
    /// No step failed.
    pub fn is_clean(&self) -> bool {
        self.steps().iter().all(|s| *s != StepOutcome::Failed)
    }

    /// Every step was skipped; nothing was held.
    pub fn is_noop(&self) -> bool {
        self.steps().iter().all(|s| *s == StepOutcome::Skipped)
    }

    fn steps(&self) -> [StepOutcome; 3] {
        [self.reset, self.unsubscribe, self.close]
    }
}

/// Bring a device up: open the bus session, then subscribe to
/// notifications.
///
/// Only valid in [`Phase::Created`]. On any failure everything acquired in
/// this call is released again and the context stays in `Created`, so the
/// call may be repeated. No retries are made here.
pub fn activate<B, N>(
    ctx: &mut DeviceContext<B, N>,
    address: B::Address,
    mut source: N,
) -> Result<(), Error<B::Error, N::Error>>
where
    B: BusTransport,
    N: NotificationSource,
{
    if ctx.phase != Phase::Created {
        error!(
            "device {}: activate refused in phase {:?}",
            ctx.device(),
            ctx.phase
        );
        return Err(Error::InvalidPhase(ctx.phase));
    }
    ctx.phase = Phase::Activating;
    debug!(
        "device {}: opening bus session at {:?}",
        ctx.device(),
        crate::fmt::dbg(&address)
    );

    let session = match ctx.transport.open(address) {
        Ok(session) => session,
        Err(e) => {
            error!(
                "device {}: bus open failed: {:?}",
                ctx.device(),
                crate::fmt::dbg(&e)
            );
            ctx.phase = Phase::Created;
            return Err(Error::TransportUnavailable(e));
        }
    };

    // The platform may deliver before `subscribe` returns.
    ctx.token.liveness().arm();
    match source.subscribe(ctx.callback, ctx.token) {
        Ok(handle) => {
            ctx.session = Some(session);
            ctx.subscription = Some(Subscription { source, handle });
            ctx.phase = Phase::Active;
            info!("device {}: active", ctx.device());
            Ok(())
        }
        Err(e) => {
            ctx.token.liveness().disarm();
            error!(
                "device {}: notification subscribe failed: {:?}",
                ctx.device(),
                crate::fmt::dbg(&e)
            );
            let _ = close_logged(&mut ctx.transport, session);
            ctx.phase = Phase::Created;
            Err(Error::SubscriptionFailed(e))
        }
    }
}

/// Tear a device down: reset the chip, unsubscribe, close the bus session.
///
/// Safe from any phase and idempotent. Each step runs even if an earlier one
/// failed; failures are logged and recorded in the report, never returned.
/// The context always ends in [`Phase::Inactive`] holding nothing.
pub fn deactivate<B, N>(ctx: &mut DeviceContext<B, N>) -> TeardownReport
where
    B: BusTransport,
    N: NotificationSource,
{
    let from = ctx.phase;
    ctx.phase = Phase::Deactivating;
    let mut report = TeardownReport::default();

    // Reset only while subscribed and the session is still open.
    if ctx.is_subscribed() {
        if let Some(session) = ctx.session.as_mut() {
            report.reset = match reset_to_default(
                &mut ctx.transport,
                session,
                ctx.defaults,
            ) {
                Ok(()) => StepOutcome::Completed,
                Err(e) => {
                    warn!(
                        "device {}: default-state write {:?} failed: {:?}",
                        ctx.token.device(),
                        e.write,
                        crate::fmt::dbg(&e.source)
                    );
                    StepOutcome::Failed
                }
            };
        }
    }

    if let Some(Subscription { mut source, handle }) = ctx.subscription.take()
    {
        ctx.token.liveness().disarm();
        report.unsubscribe = unsubscribe_logged(&mut source, handle);
    }

    if let Some(session) = ctx.session.take() {
        let in_flight = ctx.token.liveness().in_flight();
        if in_flight > 0 {
            warn!(
                "device {}: closing bus with {} callback(s) in flight",
                ctx.token.device(),
                in_flight
            );
        }
        report.close = close_logged(&mut ctx.transport, session);
    }

    ctx.phase = Phase::Inactive;
    if from != Phase::Inactive {
        info!(
            "device {}: inactive (from {:?}): {:?}",
            ctx.token.device(),
            from,
            report
        );
    }
    report
}
