//! Hardware-paced analog capture and the publish loop feeding
//! interface 0.
//!
//! The ADC free-runs while a one-shot DMA transfer, paced by the
//! sample-ready request, moves each 8-bit conversion out of the result
//! FIFO into the sample buffer. No software runs per sample, which is
//! what makes the upper sample rates reachable at all.

use defmt::{info, warn};
use embassy_rp::adc::{Adc, Async, Channel, Error as AdcError};
use embassy_rp::peripherals::DMA_CH0;
use embassy_rp::Peri;
use embassy_usb::class::cdc_acm::{ControlChanged, Sender};
use embassy_usb::driver::EndpointError;
use picoscope_common::sampling::{sample_rate_hz, CLOCK_DIV, N_SAMPLES};

use crate::pump::CONNECTED;
use crate::usb::{self, UsbDriver, ITF_CAPTURE};
use crate::{diag, indicator};

/// One acquisition cycle: returns once the transfer engine has written
/// `N_SAMPLES` bytes into `buf`. There is no timeout; a transfer the
/// hardware never completes leaves this context suspended for good and
/// only a power cycle recovers the capture interface.
async fn capture(
    adc: &mut Adc<'static, Async>,
    input: &mut Channel<'static>,
    dma: &mut Peri<'static, DMA_CH0>,
    buf: &mut [u8; N_SAMPLES],
) -> Result<(), AdcError> {
    indicator::set(true);
    let res = adc.read_many(input, buf, CLOCK_DIV, dma.reborrow()).await;
    indicator::set(false);
    res
}

/// The whole of core 0's work: while the capture interface's terminal is
/// open, acquire one sample set and hand it straight to the endpoint.
/// No channel buffer sits in this path.
#[embassy_executor::task]
pub async fn capture_publish(
    mut adc: Adc<'static, Async>,
    mut input: Channel<'static>,
    mut dma: Peri<'static, DMA_CH0>,
    mut tx: Sender<'static, UsbDriver>,
    ctl: ControlChanged<'static>,
    buf: &'static mut [u8; N_SAMPLES],
) -> ! {
    info!(
        "capture ready: {} samples per set at {} Hz",
        N_SAMPLES,
        sample_rate_hz(CLOCK_DIV as u32)
    );

    let mut sets: u32 = 0;
    loop {
        tx.wait_connection().await;
        while !tx.dtr() {
            ctl.control_changed().await;
        }
        CONNECTED.set_connected(ITF_CAPTURE, true);
        info!("capture stream opened");

        while tx.dtr() {
            if let Err(e) = capture(&mut adc, &mut input, &mut dma, buf).await {
                warn!("conversion error: {}", e);
                continue;
            }
            match usb::write_all(&mut tx, buf).await {
                Ok(()) => {
                    sets = sets.wrapping_add(1);
                    if sets % 256 == 0 {
                        diag::line(format_args!("captured {} sets", sets));
                    }
                }
                // set dropped; wait for the host to come back
                Err(EndpointError::Disabled) => break,
                Err(EndpointError::BufferOverflow) => unreachable!(),
            }
        }

        CONNECTED.set_connected(ITF_CAPTURE, false);
        info!("capture stream closed");
    }
}
