use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Register map.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    DeviceId = 0x00,
    SwitchSettings = 0x04,
    SwitchControl = 0x05,
    SwitchStatus0 = 0x06,
    SwitchStatus1 = 0x07,
    SlowL = 0x08,
    SlowR = 0x09,
    SlowMic = 0x0A,
    SlowSense = 0x0B,
    SlowGnd = 0x0C,
    DelayLR = 0x0D,
    DelayLMic = 0x0E,
    DelayLSense = 0x0F,
    DelayLAgnd = 0x10,
    Reset = 0x1E,
}

impl Register {
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Register::DeviceId
                | Register::SwitchStatus0
                | Register::SwitchStatus1
        )
    }
}

bitflags! {
    /// SWITCH_SETTINGS (0x04): per-path switch enables.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct SwitchEnable: u8 {
        const DEVICE = 0b1000_0000;
        const SBU    = 0b0110_0000;
        const USB    = 0b0001_1000;
        const SENSE  = 0b0000_0100;
        const MIC    = 0b0000_0010;
        const AGND   = 0b0000_0001;
    }
}

impl SwitchEnable {
    /// Device enabled with every path open. Written before changing the
    /// switch selection.
    pub const ALL_OPEN: Self = Self::DEVICE;
    /// Power-on default: USB data path closed.
    pub const USB_MODE: Self = Self::DEVICE.union(Self::USB);
}

impl Default for SwitchEnable {
    fn default() -> Self {
        Self::USB_MODE
    }
}

bitflags! {
    /// SWITCH_CONTROL (0x05): path selection for each enabled switch.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct SwitchSelect: u8 {
        const SBU_REVERSE = 0b0110_0000;
        const USB         = 0b0001_1000;
        const SENSE       = 0b0000_0100;
        const MIC         = 0b0000_0010;
        const AGND        = 0b0000_0001;
    }
}

impl SwitchSelect {
    /// Power-on default: USB data lines routed straight through.
    pub const USB_MODE: Self = Self::USB;
}

impl Default for SwitchSelect {
    fn default() -> Self {
        Self::USB_MODE
    }
}

/// RESET (0x1E) value that restores every register to its power-on value.
pub const RESET_ALL: u8 = 0b0000_0001;

/// Raw contents of SWITCH_STATUS0 and SWITCH_STATUS1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchStatus {
    pub status0: u8,
    pub status1: u8,
}
