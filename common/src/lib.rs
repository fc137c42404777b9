//! Shared core logic for the picoscope bridge firmware.
//!
//! This crate holds everything that does not touch a peripheral:
//! - the per-interface channel buffers the two cores trade bytes through
//! - line coding records for the bridged serial interfaces
//! - interface connection flags feeding the status indicator
//! - capture configuration constants and rate math
//!
//! All types are generic over the raw mutex, so the firmware instantiates
//! them with `CriticalSectionRawMutex` while the tests in this crate run
//! on the host with `NoopRawMutex`.

#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod coding;
pub mod sampling;
pub mod status;

#[cfg(test)]
mod test;

/// Helper macro to create a static byte buffer
#[macro_export]
macro_rules! static_byte_buffer {
    ($size:expr) => {{
        static BUFFER: ::static_cell::ConstStaticCell<[u8; $size]> =
            ::static_cell::ConstStaticCell::new([0u8; $size]);
        BUFFER.take()
    }};
}
