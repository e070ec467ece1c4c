//! Raw-report decoding against a parsed [HidInterface].
//!
//! Runs once per completed interrupt transfer, so everything here is a
//! bounded scan over fixed-size state; no allocation, no surprises.

use heapless::Vec;
use hopkey_common::report::{clamp_i8, normalize_axis, KeyboardReport, MouseReport, KEYS_IN_REPORT};

use crate::hid::interface::{HidInterface, Protocol, ReportKind};
use crate::hid::{read_field, Field, BOOT_KBD_REPORT_LEN, MODIFIER_BITS};

/// A decoded, normalized input event ready for the switching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    /// Active consumer-control usage code; 0 means released.
    Consumer(u16),
    /// Active system-control usage code; 0 means released.
    System(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Report too short to carry what its layout promises.
    ShortReport,
    /// NKRO field inconsistent with its declared usage range, or the
    /// modifier is not the 8-bit byte the bitmap layout requires.
    NkroLayout,
    /// No parsed layout claims this report ID.
    UnknownReport,
}

/// Routes a raw report to the right decoder via the report-ID dispatch
/// table built at parse time.
pub fn decode(iface: &HidInterface, raw: &[u8]) -> Result<InputEvent, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::ShortReport);
    }
    let report_id = if iface.uses_report_id { raw[0] } else { 0 };
    let kind = match iface.kind_of(report_id) {
        Some(kind) => kind,
        // Boot-protocol keyboards may never hand us a useful
        // descriptor; an 8/9-byte report is still decodable.
        None if iface.protocol == Protocol::Boot && boot_length(raw.len()) => {
            return keyboard(iface, raw).map(InputEvent::Keyboard)
        }
        None => return Err(DecodeError::UnknownReport),
    };

    match kind {
        ReportKind::Keyboard => keyboard(iface, raw).map(InputEvent::Keyboard),
        ReportKind::Mouse => Ok(InputEvent::Mouse(mouse(iface, raw))),
        ReportKind::Consumer => Ok(InputEvent::Consumer(control(
            &iface.consumer,
            iface.uses_report_id,
            raw,
        ))),
        ReportKind::System => Ok(InputEvent::System(control(
            &iface.system,
            iface.uses_report_id,
            raw,
        ))),
    }
}

fn boot_length(len: usize) -> bool {
    len == BOOT_KBD_REPORT_LEN || len == BOOT_KBD_REPORT_LEN + 1
}

/// Keyboard decode, three mutually exclusive strategies in priority
/// order: boot layout, NKRO bitmap, then the recorded "other" layout.
///
/// An 8-byte report (9 with a leading ID) always takes the boot path,
/// even on interfaces that also declare an NKRO bitmap.
pub fn keyboard(iface: &HidInterface, raw: &[u8]) -> Result<KeyboardReport, DecodeError> {
    if iface.protocol == Protocol::Boot || boot_length(raw.len()) {
        return keyboard_boot(raw);
    }
    if iface.keyboard.is_nkro {
        return keyboard_nkro(iface, raw);
    }
    keyboard_other(iface, raw)
}

/// Fixed boot layout: modifier, reserved byte, six key codes.
fn keyboard_boot(raw: &[u8]) -> Result<KeyboardReport, DecodeError> {
    // Some keyboards prefix the boot layout with a report ID anyway.
    let src = if raw.len() == BOOT_KBD_REPORT_LEN + 1 {
        &raw[1..]
    } else {
        raw
    };
    if src.len() < BOOT_KBD_REPORT_LEN {
        return Err(DecodeError::ShortReport);
    }

    let mut report = KeyboardReport {
        modifier: src[0],
        ..Default::default()
    };
    report.keycodes.copy_from_slice(&src[2..2 + KEYS_IN_REPORT]);
    Ok(report)
}

/// One key code per set bit, `usage_min` upward, capped at the six
/// output slots. The declared usage range must match the bitmap width
/// exactly or we refuse to guess.
fn keyboard_nkro(iface: &HidInterface, raw: &[u8]) -> Result<KeyboardReport, DecodeError> {
    let kb = &iface.keyboard;
    let src = skip_report_id(iface, raw);

    let span = kb.nkro.usage_max.saturating_sub(kb.nkro.usage_min).saturating_add(1);
    if span != kb.nkro.bit_size as i32 {
        return Err(DecodeError::NkroLayout);
    }
    if kb.modifier.bit_size != MODIFIER_BITS {
        return Err(DecodeError::NkroLayout);
    }

    let mut report = KeyboardReport {
        modifier: src.get(kb.modifier.byte_index()).copied().unwrap_or(0),
        ..Default::default()
    };

    let bitmap = src.get(kb.nkro.byte_index()..).unwrap_or(&[]);
    let mut keys: Vec<u8, KEYS_IN_REPORT> = Vec::new();
    for bit in 0..kb.nkro.bit_size as usize {
        let set = bitmap
            .get(bit >> 3)
            .is_some_and(|byte| byte & (1 << (bit & 7)) != 0);
        if set && keys.push((kb.nkro.usage_min + bit as i32) as u8).is_err() {
            break;
        }
    }
    report.keycodes[..keys.len()].copy_from_slice(&keys);
    Ok(report)
}

/// Report-protocol layout that is neither boot-shaped nor NKRO: the
/// modifier comes from its recorded offset and every byte flagged as an
/// array member is a key code.
fn keyboard_other(iface: &HidInterface, raw: &[u8]) -> Result<KeyboardReport, DecodeError> {
    let kb = &iface.keyboard;
    let src = skip_report_id(iface, raw);

    let mut report = KeyboardReport {
        modifier: src.get(kb.modifier.byte_index()).copied().unwrap_or(0),
        ..Default::default()
    };

    let mut keys: Vec<u8, KEYS_IN_REPORT> = Vec::new();
    for (index, is_array) in kb.key_array.iter().enumerate() {
        if *is_array && keys.push(src.get(index).copied().unwrap_or(0)).is_err() {
            break;
        }
    }
    report.keycodes[..keys.len()].copy_from_slice(&keys);
    Ok(report)
}

/// Mouse decode: stored fields through the bit reader, axes brought to
/// the common 12-bit unit.
pub fn mouse(iface: &HidInterface, raw: &[u8]) -> MouseReport {
    let m = &iface.mouse;
    let src = skip_report_id(iface, raw);

    MouseReport {
        buttons: read_field(src, &m.buttons) as u8,
        x: normalize_axis(read_field(src, &m.x), m.x.bit_size),
        y: normalize_axis(read_field(src, &m.y), m.y.bit_size),
        wheel: clamp_i8(read_field(src, &m.wheel)),
        pan: clamp_i8(read_field(src, &m.pan)),
    }
}

/// Consumer/system decode. Variable layouts map the first set bit
/// through the usage codes recorded at parse time; Array layouts report
/// the usage code directly. All zero means nothing is active.
fn control<const N: usize>(
    ctl: &super::interface::ControlLayout<N>,
    uses_report_id: bool,
    raw: &[u8],
) -> u16 {
    let src = if uses_report_id && !raw.is_empty() {
        &raw[1..]
    } else {
        raw
    };

    if ctl.is_variable {
        for position in 0..N {
            let probe = Field {
                bit_offset: position as u16,
                bit_size: 1,
                ..Field::EMPTY
            };
            if read_field(src, &probe) != 0 && ctl.usages[position] != 0 {
                return ctl.usages[position];
            }
        }
        0
    } else {
        read_field(src, &ctl.value) as u16
    }
}

fn skip_report_id<'a>(iface: &HidInterface, raw: &'a [u8]) -> &'a [u8] {
    if iface.uses_report_id && !raw.is_empty() {
        &raw[1..]
    } else {
        raw
    }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod test;
