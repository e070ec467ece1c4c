//! Report-descriptor scanner.
//!
//! One left-to-right pass over the item stream, no backtracking. Global
//! items land in a 16-slot most-recent-wins table, local usages stack
//! up until the next Input item consumes them, and every field a
//! recognized usage matches is recorded into the [HidInterface].
//!
//! The descriptor comes from the device and may be truncated, lying or
//! hostile; every path below bounds-checks and a bad descriptor ends
//! the scan early with whatever was found so far.

use hopkey_common::usage::{consumer, desktop, key_range, usage_page};

use crate::debug;
use crate::hid::interface::{HidInterface, ReportKind};
use crate::hid::{DataType, Field, ItemType, MAX_KEYS, MAX_REPORT_BITS, MAX_USAGES, MODIFIER_BITS};

const TYPE_MAIN: u8 = 0;
const TYPE_GLOBAL: u8 = 1;
const TYPE_LOCAL: u8 = 2;

mod global_tag {
    pub const USAGE_PAGE: usize = 0;
    pub const LOGICAL_MIN: usize = 1;
    pub const LOGICAL_MAX: usize = 2;
    pub const REPORT_SIZE: usize = 7;
    pub const REPORT_ID: usize = 8;
    pub const REPORT_COUNT: usize = 9;
}

mod main_tag {
    pub const INPUT: u8 = 0x8;
    pub const COLLECTION: u8 = 0xa;
    pub const COLLECTION_END: u8 = 0xc;
}

mod local_tag {
    pub const USAGE: u8 = 0;
}

const INPUT_FLAG_CONSTANT: u32 = 0x01;
const INPUT_FLAG_VARIABLE: u32 = 0x02;

/// Unpacked short-item header byte.
#[derive(Debug, Clone, Copy, Default)]
struct Header {
    /// Payload length in bytes: 0, 1, 2 or 4.
    size: u8,
    kind: u8,
    tag: u8,
}

impl Header {
    fn unpack(byte: u8) -> Self {
        Self {
            // Size class 3 means a 4-byte payload.
            size: match byte & 0x03 {
                3 => 4,
                n => n,
            },
            kind: (byte >> 2) & 0x03,
            tag: byte >> 4,
        }
    }
}

/// A header and its payload, as kept in the global/local tables.
#[derive(Debug, Clone, Copy, Default)]
struct Item {
    hdr: Header,
    val: u32,
}

impl Item {
    /// Signed reading of the payload, per its own declared size.
    /// Logical min/max need this; everything else stays unsigned.
    fn signed(&self) -> i32 {
        match self.hdr.size {
            1 => self.val as u8 as i8 as i32,
            2 => self.val as u16 as i16 as i32,
            _ => self.val as i32,
        }
    }
}

/// Collection nesting is tracked as two counters; equal counts mean we
/// are at top level, where a Usage item names the whole interface.
#[derive(Debug, Clone, Copy, Default)]
struct Collection {
    start: u8,
    end: u8,
}

impl Collection {
    fn at_top_level(&self) -> bool {
        self.start == self.end
    }
}

/// Destination of a matched field, with its merge policy.
#[derive(Debug, Clone, Copy)]
enum Sink {
    MouseButtons,
    MouseX,
    MouseY,
    MouseWheel,
    MousePan,
    Keyboard,
    Consumer,
    System,
}

/// One row of the usage matcher. Zero means "any".
struct UsageMatch {
    global_usage: u16,
    usage_page: u16,
    usage: u16,
    sink: Sink,
    kind: ReportKind,
}

impl UsageMatch {
    fn matches(&self, field: &Field) -> bool {
        (field.global_usage == self.global_usage || self.global_usage == 0)
            && (field.usage_page == self.usage_page || self.usage_page == 0)
            && (field.usage == self.usage || self.usage == 0)
    }
}

/// Ordered match table. A candidate field may fire several rows, e.g.
/// any button usage on a mouse plus the X axis specifically.
const USAGE_MAP: [UsageMatch; 8] = [
    UsageMatch {
        global_usage: desktop::MOUSE,
        usage_page: usage_page::BUTTON,
        usage: 0,
        sink: Sink::MouseButtons,
        kind: ReportKind::Mouse,
    },
    UsageMatch {
        global_usage: desktop::MOUSE,
        usage_page: usage_page::DESKTOP,
        usage: desktop::X,
        sink: Sink::MouseX,
        kind: ReportKind::Mouse,
    },
    UsageMatch {
        global_usage: desktop::MOUSE,
        usage_page: usage_page::DESKTOP,
        usage: desktop::Y,
        sink: Sink::MouseY,
        kind: ReportKind::Mouse,
    },
    UsageMatch {
        global_usage: desktop::MOUSE,
        usage_page: usage_page::DESKTOP,
        usage: desktop::WHEEL,
        sink: Sink::MouseWheel,
        kind: ReportKind::Mouse,
    },
    UsageMatch {
        global_usage: desktop::MOUSE,
        usage_page: usage_page::CONSUMER,
        usage: consumer::AC_PAN,
        sink: Sink::MousePan,
        kind: ReportKind::Mouse,
    },
    UsageMatch {
        global_usage: desktop::KEYBOARD,
        usage_page: usage_page::KEYBOARD,
        usage: 0,
        sink: Sink::Keyboard,
        kind: ReportKind::Keyboard,
    },
    UsageMatch {
        global_usage: consumer::CONSUMER_CONTROL,
        usage_page: usage_page::CONSUMER,
        usage: 0,
        sink: Sink::Consumer,
        kind: ReportKind::Consumer,
    },
    UsageMatch {
        global_usage: desktop::SYSTEM_CONTROL,
        usage_page: usage_page::DESKTOP,
        usage: 0,
        sink: Sink::System,
        kind: ReportKind::System,
    },
];

/// Transient context threaded through one parse call.
struct ParserState<'a> {
    globals: [Item; 16],
    locals: [Item; 16],
    usages: [u16; MAX_USAGES],
    /// First stack slot belonging to the current Input item. Advances
    /// by the report count of every Input item, pushed or not, so slot
    /// positions line up with field positions across the descriptor.
    usage_base: usize,
    /// Usages pushed since the last Input item.
    usage_count: usize,
    collection: Collection,
    offset_in_bits: u32,
    /// Report ID of the section currently being scanned.
    current_report_id: Option<u8>,
    /// Top-level usage naming the device class for this interface.
    global_usage: u16,
    iface: &'a mut HidInterface,
}

/// Walks `desc` and records every recognized field into `iface`.
///
/// Never fails: a malformed descriptor yields a partial or empty
/// record, which the decoder treats as "this device produces nothing".
pub fn parse(desc: &[u8], iface: &mut HidInterface) {
    let mut state = ParserState {
        globals: [Item::default(); 16],
        locals: [Item::default(); 16],
        usages: [0; MAX_USAGES],
        usage_base: 0,
        usage_count: 0,
        collection: Collection::default(),
        offset_in_bits: 0,
        current_report_id: None,
        global_usage: 0,
        iface,
    };

    let mut pos = 0;
    while pos < desc.len() {
        let hdr = Header::unpack(desc[pos]);
        pos += 1;
        let end = pos + hdr.size as usize;
        if end > desc.len() {
            debug!("descriptor item truncated at byte {}", pos);
            break;
        }
        let val = item_value(&desc[pos..end]);

        match hdr.kind {
            TYPE_MAIN => state.main_item(hdr, val),
            TYPE_GLOBAL => state.global_item(hdr, val),
            TYPE_LOCAL => state.local_item(hdr, val),
            // Reserved encoding (long items); payload already skipped.
            _ => {}
        }
        pos = end;
    }
}

/// Little-endian payload of 0, 1, 2 or 4 bytes.
fn item_value(payload: &[u8]) -> u32 {
    payload
        .iter()
        .rev()
        .fold(0u32, |acc, byte| (acc << 8) | *byte as u32)
}

impl ParserState<'_> {
    fn global_item(&mut self, hdr: Header, val: u32) {
        // 16 possible tags, one slot each, most recent wins.
        self.globals[hdr.tag as usize] = Item { hdr, val };

        if hdr.tag as usize == global_tag::REPORT_ID {
            // Each report ID opens a fresh layout; bit offsets are
            // relative to that report's own payload.
            if self.current_report_id != Some(val as u8) {
                self.current_report_id = Some(val as u8);
                self.offset_in_bits = 0;
            }
            // Reports on this interface carry a leading ID byte from
            // here on; remember which ID is the mouse's.
            if self.global_usage == desktop::MOUSE {
                self.iface.mouse.report_id = val as u8;
            }
            self.iface.uses_report_id = true;
        }
    }

    fn local_item(&mut self, hdr: Header, val: u32) {
        self.locals[hdr.tag as usize] = Item { hdr, val };

        if hdr.tag == local_tag::USAGE {
            if self.collection.at_top_level() {
                // Outside any collection the usage names the whole
                // interface: this is "a mouse" or "a keyboard".
                self.global_usage = val as u16;
            } else {
                // Pushes past capacity are dropped, not overflowed.
                let slot = self.usage_base + self.usage_count;
                if slot < MAX_USAGES {
                    self.usages[slot] = val as u16;
                    self.usage_count += 1;
                }
            }
        }
    }

    fn main_item(&mut self, hdr: Header, val: u32) {
        match hdr.tag {
            main_tag::COLLECTION => self.collection.start = self.collection.start.wrapping_add(1),
            main_tag::COLLECTION_END => self.collection.end = self.collection.end.wrapping_add(1),
            main_tag::INPUT => self.input_item(val),
            // Output/Feature fields live in separate report spaces and
            // don't move the input bit cursor.
            _ => {}
        }
    }

    /// Emits one candidate field per report-count slot and advances the
    /// bit cursor. Absent ReportSize/ReportCount read as 0 from the
    /// zeroed table, making this loop a no-op instead of a crash.
    fn input_item(&mut self, flags: u32) {
        // No report holds more than MAX_REPORT_BITS 1-bit fields, so a
        // larger count is garbage and must not stall the mount path.
        let count = self.globals[global_tag::REPORT_COUNT].val.min(MAX_REPORT_BITS);
        let size = self.globals[global_tag::REPORT_SIZE].val;

        for i in 0..count {
            if self
                .offset_in_bits
                .saturating_add(size)
                <= MAX_REPORT_BITS
            {
                let field = self.candidate(i as usize, size as u16, flags);
                self.match_field(&field);
            }
            self.offset_in_bits = self.offset_in_bits.saturating_add(size);
        }

        // Locals only live until the next main item.
        self.usage_base = (self.usage_base + count as usize).min(MAX_USAGES);
        self.usage_count = 0;
        self.locals = [Item::default(); 16];
    }

    fn candidate(&self, index: usize, size: u16, flags: u32) -> Field {
        Field {
            bit_offset: self.offset_in_bits as u16,
            bit_size: size,
            usage_min: self.globals[global_tag::LOGICAL_MIN].signed(),
            usage_max: self.globals[global_tag::LOGICAL_MAX].signed(),
            item_type: if flags & INPUT_FLAG_CONSTANT != 0 {
                ItemType::Constant
            } else {
                ItemType::Data
            },
            data_type: if flags & INPUT_FLAG_VARIABLE != 0 {
                DataType::Variable
            } else {
                DataType::Array
            },
            report_id: self.globals[global_tag::REPORT_ID].val as u8,
            global_usage: self.global_usage,
            usage_page: self.globals[global_tag::USAGE_PAGE].val as u16,
            usage: self.usage_at(index),
        }
    }

    /// Usage for the `index`-th field of the current Input item. With
    /// fewer usages than fields, the last pushed usage carries forward.
    fn usage_at(&self, index: usize) -> u16 {
        if self.usage_count == 0 {
            return 0;
        }
        let index = index.min(self.usage_count - 1);
        self.usages
            .get(self.usage_base + index)
            .copied()
            .unwrap_or(0)
    }

    fn match_field(&mut self, field: &Field) {
        for entry in &USAGE_MAP {
            if !entry.matches(field) {
                continue;
            }
            store(self.iface, entry.sink, field);
            record_id(self.iface, entry.sink, field.report_id);
            self.iface.set_kind(field.report_id, entry.kind);
        }
    }
}

/// Merge policy per destination: overwrite unless Constant, with the
/// two deliberate exceptions documented on their arms.
fn store(iface: &mut HidInterface, sink: Sink, field: &Field) {
    match sink {
        Sink::MouseButtons => {
            // Buttons arrive one narrow field at a time (Report Count N
            // x Size 1) and the run is usually closed by constant
            // padding. Widening the first stored field keeps any button
            // count representable as one contiguous bit run.
            if iface.mouse.buttons.is_present() {
                // A hostile descriptor can restate the run in every
                // report-ID section; the width stops at the report
                // bound instead of wrapping.
                iface.mouse.buttons.bit_size = iface
                    .mouse
                    .buttons
                    .bit_size
                    .saturating_add(field.bit_size)
                    .min(MAX_REPORT_BITS as u16);
                return;
            }
            if field.item_type == ItemType::Constant {
                return;
            }
            iface.mouse.buttons = *field;
            iface.mouse.is_found = true;
        }
        Sink::MouseX => store_value(&mut iface.mouse.x, field),
        Sink::MouseY => store_value(&mut iface.mouse.y, field),
        Sink::MouseWheel => store_value(&mut iface.mouse.wheel, field),
        Sink::MousePan => store_value(&mut iface.mouse.pan, field),
        Sink::Keyboard => store_keyboard(iface, field),
        Sink::Consumer => store_control(&mut iface.consumer, field),
        Sink::System => store_control(&mut iface.system, field),
    }
}

fn store_value(dst: &mut Field, field: &Field) {
    if field.item_type != ItemType::Constant {
        *dst = *field;
    }
}

fn store_keyboard(iface: &mut HidInterface, field: &Field) {
    let kb = &mut iface.keyboard;

    // Keyboard padding needs no aggregation, just skip it.
    if field.item_type == ItemType::Constant {
        return;
    }

    // The modifier byte: a narrow variable field whose usage range
    // brackets Left-Ctrl.
    if field.bit_size <= MODIFIER_BITS
        && field.data_type == DataType::Variable
        && field.usage_min <= key_range::LEFT_CTRL as i32
        && field.usage_max >= key_range::LEFT_CTRL as i32
    {
        kb.modifier = *field;
    }

    // Array members at byte positions are boot-style key codes.
    let index = field.byte_index();
    if index < MAX_KEYS {
        kb.key_array[index] = field.data_type == DataType::Array;
    }

    // NKRO bitmaps show up as one very wide variable field (size and
    // count swapped relative to the usual 1-bit-per-key declaration).
    if field.bit_size > 32 && field.data_type == DataType::Variable {
        kb.is_nkro = true;
        kb.nkro = *field;
    }

    kb.is_found = true;
}

fn store_control<const N: usize>(ctl: &mut super::interface::ControlLayout<N>, field: &Field) {
    if field.item_type == ItemType::Constant {
        return;
    }

    if field.data_type == DataType::Variable {
        // Variable layouts put one control per bit; remember which
        // usage sits at each position we can represent.
        let position = field.bit_offset as usize;
        if position < N {
            ctl.usages[position] = field.usage;
        }
        ctl.is_variable = true;
    } else {
        ctl.is_array = true;
    }

    ctl.value = *field;
    ctl.is_found = true;
}

fn record_id(iface: &mut HidInterface, sink: Sink, report_id: u8) {
    match sink {
        Sink::MouseButtons | Sink::MouseX | Sink::MouseY | Sink::MouseWheel | Sink::MousePan => {
            iface.mouse.report_id = report_id
        }
        Sink::Keyboard => iface.keyboard.report_id = report_id,
        Sink::Consumer => iface.consumer.report_id = report_id,
        Sink::System => iface.system.report_id = report_id,
    }
}

#[cfg(test)]
#[path = "descriptor_test.rs"]
mod test;
