//! Best-effort text diagnostics on interface 1.
//!
//! Producers on either core format a line into a pipe without blocking;
//! a line that does not fit, or arrives while no terminal is attached,
//! is dropped whole. A single task drains the pipe into the endpoint.

use core::fmt::{self, Write as _};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_usb::class::cdc_acm::{ControlChanged, Sender};
use heapless::String;
use picoscope_common::sampling::{sample_rate_hz, CLOCK_DIV, N_SAMPLES};

use crate::pump::CONNECTED;
use crate::usb::{UsbDriver, ITF_DIAG};

const PIPE_SIZE: usize = 512;
const MAX_LINE: usize = 128;

static PIPE: Pipe<CriticalSectionRawMutex, PIPE_SIZE> = Pipe::new();

/// Queue one diagnostic line, newline-terminated. Never blocks.
pub fn line(args: fmt::Arguments<'_>) {
    if !CONNECTED.is_connected(ITF_DIAG) {
        return;
    }
    let mut s: String<MAX_LINE> = String::new();
    if write!(s, "{}\r\n", args).is_err() {
        // oversized line, drop it
        return;
    }
    if PIPE.free_capacity() >= s.len() {
        let _ = PIPE.try_write(s.as_bytes());
    }
}

/// Drain the pipe to the interface-1 terminal while one is attached.
#[embassy_executor::task]
pub async fn diag_task(mut tx: Sender<'static, UsbDriver>, ctl: ControlChanged<'static>) -> ! {
    let mut buf = [0u8; 64];
    loop {
        tx.wait_connection().await;
        while !tx.dtr() {
            ctl.control_changed().await;
        }
        CONNECTED.set_connected(ITF_DIAG, true);
        line(format_args!(
            "picoscope: {} samples per set at {} Hz",
            N_SAMPLES,
            sample_rate_hz(CLOCK_DIV as u32)
        ));

        loop {
            let mut n = match select(PIPE.read(&mut buf), ctl.control_changed()).await {
                Either::First(n) => n,
                Either::Second(()) => {
                    if tx.dtr() {
                        continue;
                    }
                    break;
                }
            };
            // write until the pipe runs dry; a short or zero-length
            // packet closes the transfer for the host
            loop {
                if tx.write_packet(&buf[..n]).await.is_err() {
                    break;
                }
                if n < buf.len() {
                    break;
                }
                n = PIPE.try_read(&mut buf).unwrap_or(0);
                if n == 0 {
                    let _ = tx.write_packet(&[]).await;
                    break;
                }
            }
        }

        CONNECTED.set_connected(ITF_DIAG, false);
    }
}
