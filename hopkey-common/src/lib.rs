#![no_std]
pub mod report;
pub mod usage;
