//! Glue between the USB host stack's callbacks and the HID core.
//!
//! The host stack calls [HidHost::on_mount] once per interface with the
//! report descriptor, then [HidHost::on_report] per interrupt transfer.
//! Decoded events leave through a bounded channel consumed by the
//! switching/forwarding task, possibly on the other core; this side
//! never blocks on it.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::hid::decode::{decode, DecodeError, InputEvent};
use crate::hid::descriptor;
use crate::hid::interface::{HidInterface, InterfaceTable, Protocol};
use crate::{debug, info, warn};

/// Bounded handoff of decoded events to the forwarding policy.
pub struct InputEventChannel<M: RawMutex, const N: usize>(Channel<M, InputEvent, N>);

impl<M: RawMutex, const N: usize> Default for InputEventChannel<M, N> {
    fn default() -> Self {
        Self(Channel::new())
    }
}

impl<M: RawMutex, const N: usize> InputEventChannel<M, N> {
    pub async fn receive(&self) -> InputEvent {
        self.0.receive().await
    }

    pub fn try_receive(&self) -> Option<InputEvent> {
        self.0.try_receive().ok()
    }

    /// Non-blocking send; the input path drops rather than stalls when
    /// the consumer falls behind.
    pub fn try_send(&self, event: InputEvent) -> bool {
        self.0.try_send(event).is_ok()
    }
}

pub struct HidHost<'c, M: RawMutex, const N: usize> {
    interfaces: InterfaceTable,
    events: &'c InputEventChannel<M, N>,
}

impl<'c, M: RawMutex, const N: usize> HidHost<'c, M, N> {
    pub fn new(events: &'c InputEventChannel<M, N>) -> Self {
        Self {
            interfaces: InterfaceTable::new(),
            events,
        }
    }

    /// Device-mount callback: parse the descriptor before any report
    /// for this interface can arrive.
    pub fn on_mount(&mut self, dev_addr: u8, instance: u8, protocol: Protocol, desc: &[u8]) {
        let Some(iface) = self.interfaces.get_mut(dev_addr, instance) else {
            warn!("mount for out-of-range slot {}:{}", dev_addr, instance);
            return;
        };
        iface.clear();
        iface.protocol = protocol;
        descriptor::parse(desc, iface);

        if iface.is_unrecognized() {
            // Valid terminal state: the device stays enumerated but
            // will produce no events.
            info!("device {}:{} matched no known usage", dev_addr, instance);
        } else {
            debug!(
                "device {}:{} kbd={} mouse={} cc={} sys={}",
                dev_addr,
                instance,
                iface.keyboard.is_found,
                iface.mouse.is_found,
                iface.consumer.is_found,
                iface.system.is_found
            );
        }
    }

    /// Unplug/reset callback: the slot is zeroed for the next device.
    pub fn on_unmount(&mut self, dev_addr: u8, instance: u8) {
        if let Some(iface) = self.interfaces.get_mut(dev_addr, instance) {
            iface.clear();
        }
    }

    /// Report-received callback: decode and hand off. Returns the
    /// event for callers that want it (tests, local policy).
    pub fn on_report(&mut self, dev_addr: u8, instance: u8, raw: &[u8]) -> Option<InputEvent> {
        let iface = self.interfaces.get(dev_addr, instance)?;
        match decode(iface, raw) {
            Ok(event) => {
                if !self.events.try_send(event) {
                    warn!("input event queue full, dropping");
                }
                Some(event)
            }
            Err(DecodeError::UnknownReport) => {
                debug!("unroutable report on {}:{}", dev_addr, instance);
                None
            }
            Err(err) => {
                warn!("decode failed on {}:{}: {:?}", dev_addr, instance, err);
                None
            }
        }
    }

    pub fn interface(&self, dev_addr: u8, instance: u8) -> Option<&HidInterface> {
        self.interfaces.get(dev_addr, instance)
    }
}

#[cfg(test)]
#[path = "host_test.rs"]
mod test;
