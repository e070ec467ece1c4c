//! Normalized input reports exchanged between the two boards.
//!
//! Whatever precision the attached device reports at, pointer deltas
//! are carried in a common 12-bit unit so the clamping and screen-edge
//! logic downstream only ever deals with one resolution.

/// Key-code slots in a normalized keyboard report (boot-layout shape).
pub const KEYS_IN_REPORT: usize = 6;

/// Bit width of the common pointer-axis unit.
pub const AXIS_BITS: u16 = 12;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub keycodes: [u8; KEYS_IN_REPORT],
}

impl KeyboardReport {
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|kc| *kc == 0)
    }

    pub fn contains(&self, keycode: u8) -> bool {
        keycode != 0 && self.keycodes.contains(&keycode)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: u8,
    /// Delta in 12-bit units.
    pub x: i16,
    /// Delta in 12-bit units.
    pub y: i16,
    pub wheel: i8,
    pub pan: i8,
}

impl MouseReport {
    pub fn is_empty(&self) -> bool {
        self.buttons == 0 && self.x == 0 && self.y == 0 && self.wheel == 0 && self.pan == 0
    }
}

/// Scales a raw axis delta of `bit_size` bits to the 12-bit unit.
///
/// 8-bit mice scale up, 16-bit mice scale down, 12-bit values pass
/// through unchanged.
pub fn normalize_axis(value: i32, bit_size: u16) -> i16 {
    let scaled = match bit_size {
        0..=8 => value << 4,
        9..=AXIS_BITS => value,
        _ => value >> 4,
    };
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Saturating narrowing for wheel/pan values.
pub fn clamp_i8(value: i32) -> i8 {
    value.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

#[cfg(test)]
#[path = "report_test.rs"]
mod test;
