#![no_std]
pub mod hid;
pub mod host;

#[macro_use]
mod macros;
