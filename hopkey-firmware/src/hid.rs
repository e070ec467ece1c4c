//! HID report-descriptor interpretation and bit-level report decoding.
//!
//! A hot-plugged device hands us its report descriptor once at mount
//! time; [descriptor] walks it and records where the fields we care
//! about live. Every interrupt transfer after that goes through
//! [decode], which pulls the recorded fields out of the raw bytes.
//! Descriptors come from untrusted devices, so every lookup in here is
//! bounds-checked and malformed input degrades to "nothing found".

pub mod decode;
pub mod descriptor;
pub mod interface;

pub const MAX_DEVICES: usize = 3;
pub const MAX_INTERFACES: usize = 6;
pub const MAX_REPORTS: usize = 24;
pub const MAX_USAGES: usize = 128;
pub const MAX_KEYS: usize = 32;
pub const MAX_CC_BUTTONS: usize = 16;
pub const MAX_SYS_BUTTONS: usize = 8;

/// Longest raw report we will ever index into.
pub const MAX_REPORT_BYTES: usize = 64;
pub const MAX_REPORT_BITS: u32 = (MAX_REPORT_BYTES * 8) as u32;

/// Boot-protocol keyboard report: modifier, reserved, 6 key codes.
pub const BOOT_KBD_REPORT_LEN: usize = 8;
pub const MODIFIER_BITS: u16 = 8;

/// Main-item type bit: Data (0) or Constant (1). Constants are padding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ItemType {
    #[default]
    Data,
    Constant,
}

/// Main-item type bit: Array (0) or Variable (1).
///
/// Variable fields report a value every report; Array fields report a
/// selected usage code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataType {
    #[default]
    Array,
    Variable,
}

/// Where one value lives in a raw report, and what it means.
///
/// Built by the descriptor scanner, consumed by the decoder. Offsets
/// never include the optional leading report-ID byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    /// Offset of the first bit within the report.
    pub bit_offset: u16,
    /// Width in bits, 1..=32 for readable fields (NKRO bitmaps go wider
    /// but are scanned byte-wise, never through [read_field]).
    pub bit_size: u16,
    pub usage_min: i32,
    pub usage_max: i32,
    pub item_type: ItemType,
    pub data_type: DataType,
    pub report_id: u8,
    pub global_usage: u16,
    pub usage_page: u16,
    pub usage: u16,
}

impl Field {
    pub const EMPTY: Field = Field {
        bit_offset: 0,
        bit_size: 0,
        usage_min: 0,
        usage_max: 0,
        item_type: ItemType::Data,
        data_type: DataType::Array,
        report_id: 0,
        global_usage: 0,
        usage_page: 0,
        usage: 0,
    };

    /// Byte the field starts in; exact only for byte-aligned fields.
    pub fn byte_index(&self) -> usize {
        (self.bit_offset >> 3) as usize
    }

    pub fn is_present(&self) -> bool {
        self.bit_size != 0
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Extracts `field.bit_size` bits at `field.bit_offset` from `report`
/// as a sign-extended two's-complement value.
///
/// Reads past the end of `report` yield zero bits; a field that starts
/// beyond the buffer reads as 0. Short or lying reports must never
/// fault here.
pub fn read_field(report: &[u8], field: &Field) -> i32 {
    let byte_offset = field.byte_index();
    if byte_offset >= report.len() || field.bit_size == 0 {
        return 0;
    }

    let bit_shift = (field.bit_offset & 7) as u32;
    let size = field.bit_size.min(32) as u32;
    let mask: u32 = if size >= 32 { u32::MAX } else { (1 << size) - 1 };

    let mut result = (report[byte_offset] as u32) >> bit_shift;
    let mut collected = 8 - bit_shift;
    let mut index = byte_offset;
    while size > collected {
        index += 1;
        let byte = report.get(index).copied().unwrap_or(0) as u32;
        result |= byte << collected;
        collected += 8;
    }
    result &= mask;

    // Top bit of the extracted width set means the value is negative.
    if size < 32 && result & ((mask >> 1) + 1) != 0 {
        result |= u32::MAX << size;
    }
    result as i32
}

#[cfg(test)]
#[path = "hid_test.rs"]
mod test;
