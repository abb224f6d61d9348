use std::cell::{Cell, RefCell};
use std::rc::Rc;

use device_lifecycle::{
    Correlation, Error, Liveness, NotificationCallback, Phase, StepOutcome,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, Operation};
use fsa4480::DEFAULT_ADDRESS;
use fsa4480_driver::{
    on_acpi_notify, AcpiInterface, AddRefused, DriverError, Fsa4480Driver,
    I2cTransport, TransportError, DEFAULT_STATE,
};

// ---------------------------------------------------------------------------
// Mock I2C bus; state is shared so tests can inspect it after the bus has
// moved into the driver.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Nack;

impl i2c::Error for Nack {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Unknown)
    }
}

#[derive(Default)]
struct BusState {
    reads: Cell<usize>,
    writes: RefCell<Vec<Vec<u8>>>,
    /// NACK every transaction.
    absent: Cell<bool>,
    /// NACK writes only.
    nack_writes: Cell<bool>,
}

struct MockI2c(Rc<BusState>);

impl ErrorType for MockI2c {
    type Error = Nack;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Nack> {
        if self.0.absent.get() {
            return Err(Nack);
        }
        match operations {
            [Operation::Write(_), Operation::Read(buf)] => {
                self.0.reads.set(self.0.reads.get() + 1);
                buf.fill(0x09);
                Ok(())
            }
            [Operation::Write(bytes)] => {
                if self.0.nack_writes.get() {
                    return Err(Nack);
                }
                self.0.writes.borrow_mut().push(bytes.to_vec());
                Ok(())
            }
            _ => Err(Nack),
        }
    }
}

struct MockDelay(Rc<Cell<u64>>);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + u64::from(ns));
    }
}

// ---------------------------------------------------------------------------
// Mock ACPI interface
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
struct RegistrationRefused;

#[derive(Default)]
struct MockAcpi {
    registered: RefCell<Option<(NotificationCallback, Correlation)>>,
    unregistered: Cell<usize>,
    refuse: Cell<bool>,
}

impl AcpiInterface for MockAcpi {
    type Error = RegistrationRefused;

    fn register_for_device_notifications(
        &self,
        callback: NotificationCallback,
        token: Correlation,
    ) -> Result<(), RegistrationRefused> {
        if self.refuse.get() {
            return Err(RegistrationRefused);
        }
        *self.registered.borrow_mut() = Some((callback, token));
        Ok(())
    }

    fn unregister_for_device_notifications(&self) {
        self.unregistered.set(self.unregistered.get() + 1);
    }
}

impl MockAcpi {
    fn token(&self) -> Correlation {
        self.registered.borrow().expect("not registered").1
    }
}

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

type Driver<'a, const N: usize> =
    Fsa4480Driver<'a, MockI2c, MockDelay, MockAcpi, N>;

type Refused =
    AddRefused<MockI2c, MockDelay, DriverError<Nack, RegistrationRefused>>;

type AddResult = Result<(), Refused>;

fn add<'a, const N: usize>(
    driver: &mut Driver<'a, N>,
    id: u32,
    board: &Board,
    acpi: &'a MockAcpi,
) -> AddResult {
    driver.device_add(id, board.transport(), DEFAULT_ADDRESS, acpi)
}

fn pool(n: usize) -> &'static [Liveness] {
    let pool: Vec<Liveness> = (0..n).map(|_| Liveness::new()).collect();
    Box::leak(pool.into_boxed_slice())
}

struct Board {
    bus: Rc<BusState>,
    waited_ns: Rc<Cell<u64>>,
}

impl Board {
    fn new() -> Self {
        Self { bus: Rc::default(), waited_ns: Rc::default() }
    }

    fn transport(&self) -> I2cTransport<MockI2c, MockDelay> {
        I2cTransport::new(
            MockI2c(self.bus.clone()),
            MockDelay(self.waited_ns.clone()),
        )
    }

    fn writes(&self) -> Vec<Vec<u8>> {
        self.bus.writes.borrow().clone()
    }
}

fn default_state_writes() -> Vec<Vec<u8>> {
    DEFAULT_STATE.iter().map(|w| vec![w.register, w.value]).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn default_state_restores_usb_routing() {
    assert_eq!(
        default_state_writes(),
        vec![vec![0x04, 0x80], vec![0x05, 0x18], vec![0x04, 0x98]]
    );
}

#[test]
fn device_add_probes_chip_and_registers() {
    let board = Board::new();
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));

    add(&mut driver, 1, &board, &acpi).unwrap();

    let ctx = driver.device(1).unwrap();
    assert_eq!(ctx.phase(), Phase::Active);
    assert!(ctx.is_subscribed());
    assert!(!ctx.transport().is_idle());
    assert_eq!(board.bus.reads.get(), 1);
    assert!(board.writes().is_empty());
    assert_eq!(acpi.token().device(), 1);
    assert!(acpi.token().liveness().is_live());
}

#[test]
fn device_remove_resets_chip_then_unregisters() {
    let board = Board::new();
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 1, &board, &acpi).unwrap();

    let (report, transport) = driver.device_remove(1).unwrap();

    assert!(report.is_clean());
    assert_eq!(board.writes(), default_state_writes());
    assert_eq!(board.waited_ns.get(), u64::from(fsa4480::SETTLE_US) * 1_000);
    assert_eq!(acpi.unregistered.get(), 1);
    assert!(transport.is_idle());
    assert!(driver.device(1).is_none());
    assert!(driver.is_empty());
}

#[test]
fn unload_after_remove_touches_nothing() {
    let board = Board::new();
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 1, &board, &acpi).unwrap();
    driver.device_remove(1).unwrap();
    let writes = board.writes().len();

    assert_eq!(driver.unload(), 0);

    assert_eq!(board.writes().len(), writes);
    assert_eq!(acpi.unregistered.get(), 1);
    assert!(driver.is_empty());
}

#[test]
fn unload_tears_down_devices_never_removed() {
    let first = Board::new();
    let second = Board::new();
    let acpi_first = MockAcpi::default();
    let acpi_second = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 1, &first, &acpi_first).unwrap();
    add(&mut driver, 2, &second, &acpi_second).unwrap();
    driver.device_remove(1).unwrap();

    assert_eq!(driver.unload(), 1);

    assert_eq!(second.writes(), default_state_writes());
    assert_eq!(acpi_first.unregistered.get(), 1);
    assert_eq!(acpi_second.unregistered.get(), 1);
    assert_eq!(driver.len(), 0);
}

#[test]
fn absent_chip_fails_bring_up() {
    let board = Board::new();
    board.bus.absent.set(true);
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));

    let refused = add(&mut driver, 1, &board, &acpi).unwrap_err();

    assert_eq!(
        refused.error,
        DriverError::Activation(Error::TransportUnavailable(
            TransportError::Chip(fsa4480::Error::I2c(Nack))
        ))
    );
    assert!(refused.transport.is_idle());
    assert!(acpi.registered.borrow().is_none());
    assert!(driver.device(1).is_none());

    // Once the chip answers, the same bus can be offered again.
    board.bus.absent.set(false);
    driver
        .device_add(1, refused.transport, DEFAULT_ADDRESS, &acpi)
        .unwrap();
    assert_eq!(driver.device(1).unwrap().phase(), Phase::Active);
}

#[test]
fn refused_registration_fails_bring_up() {
    let board = Board::new();
    let acpi = MockAcpi::default();
    acpi.refuse.set(true);
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));

    let refused = add(&mut driver, 1, &board, &acpi).unwrap_err();

    assert_eq!(
        refused.error,
        DriverError::Activation(Error::SubscriptionFailed(RegistrationRefused))
    );
    assert!(refused.transport.is_idle());
    assert!(board.writes().is_empty());
    assert_eq!(acpi.unregistered.get(), 0);
    assert!(driver.is_empty());

    // The slot and the bus are both free for the next attempt.
    acpi.refuse.set(false);
    driver
        .device_add(1, refused.transport, DEFAULT_ADDRESS, &acpi)
        .unwrap();
    assert_eq!(driver.len(), 1);
    assert_eq!(board.bus.reads.get(), 2);
}

#[test]
fn reset_nack_does_not_block_removal() {
    let board = Board::new();
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 1, &board, &acpi).unwrap();
    board.bus.nack_writes.set(true);

    let (report, transport) = driver.device_remove(1).unwrap();

    assert_eq!(report.reset, StepOutcome::Failed);
    assert_eq!(report.unsubscribe, StepOutcome::Completed);
    assert_eq!(report.close, StepOutcome::Completed);
    assert_eq!(acpi.unregistered.get(), 1);
    assert!(transport.is_idle());
    assert!(driver.is_empty());
}

#[test]
fn duplicate_and_unknown_devices() {
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 1, &Board::new(), &acpi).unwrap();

    let refused = add(&mut driver, 1, &Board::new(), &acpi).unwrap_err();
    assert_eq!(refused.error, DriverError::DuplicateDevice(1));
    assert!(refused.transport.is_idle());
    assert!(matches!(
        driver.device_remove(9),
        Err(DriverError::UnknownDevice(9))
    ));
    assert_eq!(driver.len(), 1);
}

#[test]
fn table_and_pool_limits() {
    let acpi = MockAcpi::default();

    // Pool smaller than the table.
    let mut driver: Driver<'_, 4> = Driver::new(pool(1));
    add(&mut driver, 1, &Board::new(), &acpi).unwrap();
    assert_eq!(
        add(&mut driver, 2, &Board::new(), &acpi).unwrap_err().error,
        DriverError::NoFreeSlot
    );

    // Table smaller than the pool.
    let mut driver: Driver<'_, 1> = Driver::new(pool(4));
    add(&mut driver, 1, &Board::new(), &acpi).unwrap();
    assert_eq!(
        add(&mut driver, 2, &Board::new(), &acpi).unwrap_err().error,
        DriverError::NoFreeSlot
    );
}

#[test]
fn device_can_arrive_again_after_removal() {
    let board = Board::new();
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 1, &board, &acpi).unwrap();
    let (_, transport) = driver.device_remove(1).unwrap();

    driver.device_add(1, transport, DEFAULT_ADDRESS, &acpi).unwrap();

    let ctx = driver.device(1).unwrap();
    assert_eq!(ctx.phase(), Phase::Active);
    assert!(acpi.token().liveness().is_live());
    assert_eq!(driver.len(), 1);
}

#[test]
fn removal_frees_slots_for_later_arrivals() {
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 100, &Board::new(), &acpi).unwrap();

    for id in 0..5 {
        add(&mut driver, id, &Board::new(), &acpi).unwrap();
        assert_eq!(driver.len(), 2);
        let (report, _) = driver.device_remove(id).unwrap();
        assert!(report.is_clean());
    }

    // The long-lived device never lost its slot.
    assert_eq!(driver.device(100).unwrap().phase(), Phase::Active);
    assert_eq!(driver.unload(), 1);
}

#[test]
fn recycled_slot_ignores_stale_token_until_rearmed() {
    let acpi_old = MockAcpi::default();
    let acpi_new = MockAcpi::default();
    let mut driver: Driver<'_, 1> = Driver::new(pool(1));
    add(&mut driver, 1, &Board::new(), &acpi_old).unwrap();
    let stale = acpi_old.token();
    driver.device_remove(1).unwrap();
    assert!(stale.enter().is_none());

    add(&mut driver, 2, &Board::new(), &acpi_new).unwrap();

    let fresh = acpi_new.token();
    assert_eq!(fresh.device(), 2);
    assert!(core::ptr::eq(fresh.liveness(), stale.liveness()));
    assert!(fresh.enter().is_some());
}

#[test]
fn late_notify_after_removal_is_dropped() {
    let board = Board::new();
    let acpi = MockAcpi::default();
    let mut driver: Driver<'_, 2> = Driver::new(pool(2));
    add(&mut driver, 1, &board, &acpi).unwrap();
    let token = acpi.token();

    on_acpi_notify(token, 0x80);
    assert_eq!(token.liveness().in_flight(), 0);

    driver.device_remove(1).unwrap();

    assert!(token.enter().is_none());
    on_acpi_notify(token, 0x80);
    assert_eq!(token.liveness().in_flight(), 0);
    assert_eq!(board.writes(), default_state_writes());
}
