//! Capture configuration, shared between the firmware and its tests.
//!
//! Everything here is a compile-time choice. Changing the sample rate
//! means re-deriving [`CLOCK_DIV`], not flipping a runtime switch.

/// ADC conversion clock, fixed by the chip at 48 MHz.
pub const ADC_CLOCK_HZ: u32 = 48_000_000;

/// Conversion clock divisor selecting the effective sample rate:
///
/// | divisor | rate       |
/// |---------|------------|
/// | 96      | 500 000 Hz |
/// | 240     | 200 000 Hz |
/// | 480     | 100 000 Hz |
/// | 960     | 50 000 Hz  |
/// | 9600    | 5 000 Hz   |
pub const CLOCK_DIV: u16 = 240;

/// Samples per capture set. The stream carries no framing; hosts parse
/// it in chunks of exactly this many bytes.
pub const N_SAMPLES: usize = 500;

/// Effective sample rate for a conversion clock divisor.
pub const fn sample_rate_hz(divisor: u32) -> u32 {
    ADC_CLOCK_HZ / divisor
}
