//! HID usage pages and the usages this firmware cares about.
//!
//! Only the handful of pages/usages needed to classify keyboards, mice
//! and the media/power keys that ride along with them.

pub mod usage_page {
    pub const DESKTOP: u16 = 0x01;
    pub const KEYBOARD: u16 = 0x07;
    pub const LED: u16 = 0x08;
    pub const BUTTON: u16 = 0x09;
    pub const CONSUMER: u16 = 0x0c;
}

/// Generic Desktop page (0x01).
pub mod desktop {
    pub const POINTER: u16 = 0x01;
    pub const MOUSE: u16 = 0x02;
    pub const KEYBOARD: u16 = 0x06;
    pub const X: u16 = 0x30;
    pub const Y: u16 = 0x31;
    pub const WHEEL: u16 = 0x38;
    pub const SYSTEM_CONTROL: u16 = 0x80;
    pub const SYSTEM_POWER_DOWN: u16 = 0x81;
    pub const SYSTEM_SLEEP: u16 = 0x82;
    pub const SYSTEM_WAKE_UP: u16 = 0x83;
}

/// Consumer page (0x0c).
pub mod consumer {
    pub const CONSUMER_CONTROL: u16 = 0x01;
    pub const PLAY_PAUSE: u16 = 0xcd;
    pub const MUTE: u16 = 0xe2;
    pub const VOLUME_UP: u16 = 0xe9;
    pub const VOLUME_DOWN: u16 = 0xea;
    pub const AC_PAN: u16 = 0x0238;
}

/// Keyboard/Keypad page (0x07) key-code landmarks.
pub mod key_range {
    pub const BASIC_MIN: u8 = 0x04;
    pub const BASIC_MAX: u8 = 0xdd;
    pub const LEFT_CTRL: u8 = 0xe0;
    pub const MODIFIER_MIN: u8 = 0xe0;
    pub const MODIFIER_MAX: u8 = 0xe7;
}
