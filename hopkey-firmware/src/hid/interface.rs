//! Per-interface record of what the descriptor scan discovered.
//!
//! One [HidInterface] exists per (device slot, interface instance).
//! It is written exactly once, by the scanner inside the mount
//! callback, then only read by the decoder until the unmount path
//! clears it.

use super::{Field, MAX_CC_BUTTONS, MAX_DEVICES, MAX_INTERFACES, MAX_KEYS, MAX_REPORTS, MAX_SYS_BUTTONS};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    Boot,
    #[default]
    Report,
}

/// Which logical device a report ID belongs to.
///
/// Classified once at parse time; per-report dispatch is a bounded
/// table lookup, not a descriptor walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    Keyboard,
    Mouse,
    Consumer,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardLayout {
    pub modifier: Field,
    pub nkro: Field,
    /// Marks which byte positions hold boot-style key codes in a
    /// report-protocol layout.
    pub key_array: [bool; MAX_KEYS],
    pub report_id: u8,
    pub is_found: bool,
    pub is_nkro: bool,
}

impl KeyboardLayout {
    pub const fn new() -> Self {
        Self {
            modifier: Field::EMPTY,
            nkro: Field::EMPTY,
            key_array: [false; MAX_KEYS],
            report_id: 0,
            is_found: false,
            is_nkro: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseLayout {
    pub buttons: Field,
    pub x: Field,
    pub y: Field,
    pub wheel: Field,
    pub pan: Field,
    pub report_id: u8,
    pub is_found: bool,
}

impl MouseLayout {
    pub const fn new() -> Self {
        Self {
            buttons: Field::EMPTY,
            x: Field::EMPTY,
            y: Field::EMPTY,
            wheel: Field::EMPTY,
            pan: Field::EMPTY,
            report_id: 0,
            is_found: false,
        }
    }
}

/// Consumer-control and system-control sub-records share this shape:
/// one value field plus the usage code seen at each bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlLayout<const N: usize> {
    pub value: Field,
    /// Usage code per bit position, Variable layouts only.
    pub usages: [u16; N],
    pub report_id: u8,
    pub is_variable: bool,
    pub is_array: bool,
    pub is_found: bool,
}

impl<const N: usize> ControlLayout<N> {
    pub const fn new() -> Self {
        Self {
            value: Field::EMPTY,
            usages: [0; N],
            report_id: 0,
            is_variable: false,
            is_array: false,
            is_found: false,
        }
    }
}

impl<const N: usize> Default for ControlLayout<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidInterface {
    pub keyboard: KeyboardLayout,
    pub mouse: MouseLayout,
    pub consumer: ControlLayout<MAX_CC_BUTTONS>,
    pub system: ControlLayout<MAX_SYS_BUTTONS>,
    report_kind: [Option<ReportKind>; MAX_REPORTS],
    pub protocol: Protocol,
    pub uses_report_id: bool,
}

impl HidInterface {
    pub const fn new() -> Self {
        Self {
            keyboard: KeyboardLayout::new(),
            mouse: MouseLayout::new(),
            consumer: ControlLayout::new(),
            system: ControlLayout::new(),
            report_kind: [None; MAX_REPORTS],
            protocol: Protocol::Report,
            uses_report_id: false,
        }
    }

    /// Resets the record to its mount-time state.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn kind_of(&self, report_id: u8) -> Option<ReportKind> {
        self.report_kind.get(report_id as usize).copied().flatten()
    }

    /// Report IDs past the table are ignored, not indexed.
    pub(crate) fn set_kind(&mut self, report_id: u8, kind: ReportKind) {
        if let Some(slot) = self.report_kind.get_mut(report_id as usize) {
            *slot = Some(kind);
        }
    }

    /// True when the descriptor matched nothing we understand.
    pub fn is_unrecognized(&self) -> bool {
        !self.keyboard.is_found
            && !self.mouse.is_found
            && !self.consumer.is_found
            && !self.system.is_found
    }
}

impl Default for HidInterface {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed pool of interface records addressed by (device address,
/// interface instance). Out-of-range addresses return nothing rather
/// than wrapping.
pub struct InterfaceTable {
    slots: [[HidInterface; MAX_INTERFACES]; MAX_DEVICES],
}

impl InterfaceTable {
    pub const fn new() -> Self {
        Self {
            slots: [[HidInterface::new(); MAX_INTERFACES]; MAX_DEVICES],
        }
    }

    pub fn get(&self, dev_addr: u8, instance: u8) -> Option<&HidInterface> {
        self.slots.get(dev_addr as usize)?.get(instance as usize)
    }

    pub fn get_mut(&mut self, dev_addr: u8, instance: u8) -> Option<&mut HidInterface> {
        self.slots.get_mut(dev_addr as usize)?.get_mut(instance as usize)
    }
}

impl Default for InterfaceTable {
    fn default() -> Self {
        Self::new()
    }
}
