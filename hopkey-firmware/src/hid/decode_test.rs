use super::*;
use crate::hid::descriptor::parse;
use crate::hid::MAX_KEYS;

extern crate std;

fn parsed(desc: &[u8]) -> HidInterface {
    let mut iface = HidInterface::new();
    parse(desc, &mut iface);
    iface
}

fn boot_mouse() -> HidInterface {
    parsed(&[
        0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, // Mouse, Application
        0x09, 0x01, 0xa1, 0x00, // Pointer, Physical
        0x05, 0x09, 0x19, 0x01, 0x29, 0x03, // Buttons 1..3
        0x15, 0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x03, 0x81, 0x02,
        0x95, 0x01, 0x75, 0x05, 0x81, 0x01, // 5-bit pad
        0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x09, 0x38, // X, Y, Wheel
        0x15, 0x81, 0x25, 0x7f, 0x75, 0x08, 0x95, 0x03, 0x81, 0x06,
        0xc0, 0xc0,
    ])
}

fn nkro_keyboard() -> HidInterface {
    parsed(&[
        0x05, 0x01, 0x09, 0x06, 0xa1, 0x01, // Keyboard, Application
        0x05, 0x07, // Keyboard/Keypad page
        0x16, 0xe0, 0x00, 0x26, 0xe7, 0x00, // Logical 224..231
        0x75, 0x08, 0x95, 0x01, 0x81, 0x02, // 8-bit modifier
        0x15, 0x04, 0x26, 0xf3, 0x00, // Logical 4..243
        0x75, 0xf0, 0x95, 0x01, 0x81, 0x02, // 240-bit NKRO bitmap
        0xc0,
    ])
}

#[test]
fn boot_mouse_end_to_end() {
    let iface = boot_mouse();
    let raw = [0x01, 10, (-5i8) as u8, 0];
    let report = mouse(&iface, &raw);

    assert_eq!(report.buttons, 0x01);
    // 8-bit deltas upscale x16 to the 12-bit unit.
    assert_eq!(report.x, 160);
    assert_eq!(report.y, -80);
    assert_eq!(report.wheel, 0);
    assert_eq!(report.pan, 0);

    assert_eq!(
        decode(&iface, &raw),
        Ok(InputEvent::Mouse(report))
    );
}

#[test]
fn short_mouse_report_reads_missing_fields_as_zero() {
    let iface = boot_mouse();
    // Only the button byte arrived.
    let report = mouse(&iface, &[0x07]);
    assert_eq!(report.buttons, 0x07);
    assert_eq!(report.x, 0);
    assert_eq!(report.y, 0);

    let report = mouse(&iface, &[]);
    assert_eq!(report, MouseReport::default());
}

#[test]
fn eight_byte_report_takes_boot_path_even_on_nkro_interface() {
    let iface = nkro_keyboard();
    assert!(iface.keyboard.is_nkro);

    let raw = [0x02, 0x00, 0x04, 0x05, 0x00, 0x00, 0x00, 0x00];
    let report = keyboard(&iface, &raw).unwrap();
    assert_eq!(report.modifier, 0x02);
    assert_eq!(report.keycodes, [0x04, 0x05, 0x00, 0x00, 0x00, 0x00]);

    // Nine bytes: same layout behind a leading report ID.
    let raw = [0x01, 0x02, 0x00, 0x04, 0x05, 0x00, 0x00, 0x00, 0x00];
    let report = keyboard(&iface, &raw).unwrap();
    assert_eq!(report.modifier, 0x02);
    assert_eq!(report.keycodes[0], 0x04);
}

#[test]
fn boot_protocol_forces_boot_layout() {
    let mut iface = nkro_keyboard();
    iface.protocol = Protocol::Boot;
    let raw = [0x00, 0x00, 0x1e, 0x00, 0x00, 0x00, 0x00, 0x00];
    let report = keyboard(&iface, &raw).unwrap();
    assert_eq!(report.keycodes[0], 0x1e);

    // Boot protocol with a short report is an error, not a wild read.
    assert_eq!(keyboard(&iface, &[0x00; 4]), Err(DecodeError::ShortReport));
}

#[test]
fn nkro_bitmap_scan_ascending_capped() {
    let iface = nkro_keyboard();

    // 31-byte report: modifier + 30 bitmap bytes.
    let mut raw = [0u8; 31];
    raw[0] = 0x01; // left ctrl
    raw[1] = 0b0010_0001; // bits 0 and 5: usages 4 and 9
    let report = keyboard(&iface, &raw).unwrap();
    assert_eq!(report.modifier, 0x01);
    assert_eq!(report.keycodes, [4, 9, 0, 0, 0, 0]);

    // More than six keys held: ascending order, capped at six.
    raw[1] = 0xff;
    let report = keyboard(&iface, &raw).unwrap();
    assert_eq!(report.keycodes, [4, 5, 6, 7, 8, 9]);
}

#[test]
fn nkro_usage_range_mismatch_is_an_error() {
    let mut iface = nkro_keyboard();
    iface.keyboard.nkro.usage_max = 100; // span no longer matches width
    assert_eq!(
        keyboard(&iface, &[0u8; 31]),
        Err(DecodeError::NkroLayout)
    );

    let mut iface = nkro_keyboard();
    iface.keyboard.modifier.bit_size = 1; // bitmap needs a whole byte
    assert_eq!(
        keyboard(&iface, &[0u8; 31]),
        Err(DecodeError::NkroLayout)
    );
}

#[test]
fn other_layout_uses_key_array_membership() {
    let iface = parsed(&[
        0x05, 0x01, 0x09, 0x06, 0xa1, 0x01, // Keyboard, Application
        0x05, 0x07, 0x16, 0xe0, 0x00, 0x26, 0xe7, 0x00, // Logical 224..231
        0x75, 0x08, 0x95, 0x01, 0x81, 0x02, // modifier byte
        0x15, 0x00, 0x26, 0xff, 0x00, // Logical 0..255
        0x95, 0x06, 0x81, 0x00, // six array key slots
        0xc0,
    ]);
    assert!(!iface.keyboard.is_nkro);

    // Seven bytes, so neither boot length nor NKRO.
    let raw = [0x08, 0x04, 0x16, 0x00, 0x00, 0x00, 0x00];
    let report = keyboard(&iface, &raw).unwrap();
    assert_eq!(report.modifier, 0x08);
    assert_eq!(report.keycodes[0], 0x04);
    assert_eq!(report.keycodes[1], 0x16);
    assert_eq!(report.keycodes[2], 0x00);
}

#[test]
fn consumer_variable_maps_bits_to_usage_codes() {
    let iface = parsed(&[
        0x05, 0x0c, 0x09, 0x01, 0xa1, 0x01, // Consumer Control
        0x15, 0x00, 0x25, 0x01, // Logical 0..1
        0x09, 0xcd, 0x09, 0xe2, 0x09, 0xe9, 0x09, 0xea, // Play/Mute/Vol+/Vol-
        0x75, 0x01, 0x95, 0x04, 0x81, 0x02, // four variable bits
        0x95, 0x04, 0x81, 0x01, // pad to a byte
        0xc0,
    ]);
    assert!(iface.consumer.is_variable);

    assert_eq!(decode(&iface, &[0b0000_0100]), Ok(InputEvent::Consumer(0xe9)));
    assert_eq!(decode(&iface, &[0b0000_0001]), Ok(InputEvent::Consumer(0xcd)));
    // Released: nothing active.
    assert_eq!(decode(&iface, &[0x00]), Ok(InputEvent::Consumer(0)));
}

#[test]
fn consumer_array_returns_code_directly() {
    let iface = parsed(&[
        0x05, 0x0c, 0x09, 0x01, 0xa1, 0x01, // Consumer Control
        0x15, 0x00, 0x26, 0x3c, 0x02, // Logical 0..572
        0x19, 0x00, 0x2a, 0x3c, 0x02, // Usage range 0..572
        0x75, 0x10, 0x95, 0x01, 0x81, 0x00, // one 16-bit array slot
        0xc0,
    ]);
    assert!(iface.consumer.is_array);
    assert!(!iface.consumer.is_variable);

    assert_eq!(decode(&iface, &[0xe9, 0x00]), Ok(InputEvent::Consumer(0xe9)));
    assert_eq!(decode(&iface, &[0x00, 0x00]), Ok(InputEvent::Consumer(0)));
}

#[test]
fn system_control_report() {
    let iface = parsed(&[
        0x05, 0x01, 0x09, 0x80, 0xa1, 0x01, // System Control
        0x15, 0x00, 0x25, 0x01, // Logical 0..1
        0x09, 0x81, 0x09, 0x82, 0x09, 0x83, // Power Down, Sleep, Wake Up
        0x75, 0x01, 0x95, 0x03, 0x81, 0x02, // three variable bits
        0x95, 0x05, 0x81, 0x01, // pad
        0xc0,
    ]);
    assert_eq!(decode(&iface, &[0b010]), Ok(InputEvent::System(0x82)));
    assert_eq!(decode(&iface, &[0]), Ok(InputEvent::System(0)));
}

#[test]
fn unroutable_reports_are_rejected() {
    let iface = boot_mouse();
    assert_eq!(decode(&iface, &[]), Err(DecodeError::ShortReport));

    let iface = HidInterface::new();
    assert_eq!(decode(&iface, &[0u8; 4]), Err(DecodeError::UnknownReport));
}

#[test]
fn report_id_dispatch_routes_by_leading_byte() {
    let iface = parsed(&[
        0x05, 0x01, 0x09, 0x06, 0xa1, 0x01, // Keyboard, report ID 1
        0x85, 0x01, 0x05, 0x07, 0x16, 0xe0, 0x00, 0x26, 0xe7, 0x00,
        0x75, 0x08, 0x95, 0x01, 0x81, 0x02, 0xc0,
        0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, // Mouse, report ID 2
        0x85, 0x02, 0x05, 0x09, 0x15, 0x00, 0x25, 0x01,
        0x75, 0x01, 0x95, 0x08, 0x81, 0x02, 0xc0,
    ]);
    assert!(iface.uses_report_id);

    match decode(&iface, &[0x02, 0xff, 0, 0]) {
        Ok(InputEvent::Mouse(report)) => assert_eq!(report.buttons, 0xff),
        other => panic!("expected mouse event, got {:?}", other),
    }
    match decode(&iface, &[0x01, 0, 0, 0, 0, 0, 0]) {
        Ok(InputEvent::Keyboard(_)) => {}
        other => panic!("expected keyboard event, got {:?}", other),
    }
    assert_eq!(decode(&iface, &[0x07, 0, 0]), Err(DecodeError::UnknownReport));
}

#[test]
fn key_array_bound_is_respected() {
    let mut iface = HidInterface::new();
    iface.keyboard.is_found = true;
    for slot in iface.keyboard.key_array.iter_mut().skip(1) {
        *slot = true;
    }
    iface.keyboard.modifier.bit_size = 8;
    assert_eq!(iface.keyboard.key_array.len(), MAX_KEYS);

    // A report shorter than the flagged positions pads with zeros.
    let report = keyboard_other(&iface, &[0x01, 0x04, 0x05]).unwrap();
    assert_eq!(report.modifier, 0x01);
    assert_eq!(report.keycodes, [0x04, 0x05, 0, 0, 0, 0]);
}
