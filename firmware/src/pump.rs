//! Byte pumps between the CDC endpoints and the channel table.
//!
//! Every interface gets a read-side pump accumulating host bytes in its
//! `from_host` buffer. Only the bridge interface has its sender free for
//! the write-side pump (interfaces 0 and 1 are written directly by the
//! capture and diagnostic tasks). The serial driver on the far side of
//! the table is expected to drain `from_host`, fill `to_host` and watch
//! the coding record; none of that happens in this firmware.

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};
use embassy_usb::class::cdc_acm::{self, ControlChanged, Receiver, Sender};
use embassy_usb::driver::EndpointError;
use picoscope_common::buffer::SerialChannel;
use picoscope_common::coding::LineCoding;
use picoscope_common::status::InterfaceFlags;

use crate::usb::{UsbDriver, NUM_INTERFACES};

/// One channel record per CDC interface, alive for the process lifetime.
pub static CHANNELS: [SerialChannel<CriticalSectionRawMutex>; NUM_INTERFACES] = [
    SerialChannel::new(),
    SerialChannel::new(),
    SerialChannel::new(),
];

/// Connected flags feeding the status indicator. Written by the tasks
/// that own each interface's sender half.
pub static CONNECTED: InterfaceFlags<NUM_INTERFACES> = InterfaceFlags::new();

/// Pause before retrying a pass that found nothing to do.
const PASS_DELAY: Duration = Duration::from_micros(500);

fn host_coding(lc: &cdc_acm::LineCoding) -> LineCoding {
    LineCoding {
        baud_rate: lc.data_rate(),
        data_bits: lc.data_bits(),
        stop_bits: lc.stop_bits() as u8,
        parity: lc.parity_type() as u8,
    }
}

/// Host-to-device side: move endpoint packets into `from_host`.
#[embassy_executor::task(pool_size = NUM_INTERFACES)]
pub async fn pump_in(
    itf: usize,
    mut rx: Receiver<'static, UsbDriver>,
    channel: &'static SerialChannel<CriticalSectionRawMutex>,
) -> ! {
    let max_packet = usize::from(rx.max_packet_size());
    let mut packet = [0u8; 64];
    loop {
        rx.wait_connection().await;
        info!("itf {}: out endpoint up", itf);

        // bytes of `packet` received but not yet stored
        let mut pending: usize = 0;
        loop {
            if pending == 0 {
                // Never request bytes that could not be stored: while the
                // buffer lacks room for a full packet, the endpoint is
                // left alone and the host sees NAKs.
                match channel.from_host.free() {
                    Some(free) if free >= max_packet => {
                        match rx.read_packet(&mut packet).await {
                            Ok(n) => pending = n,
                            Err(EndpointError::Disabled) => break,
                            Err(EndpointError::BufferOverflow) => unreachable!(),
                        }
                    }
                    _ => {
                        Timer::after(PASS_DELAY).await;
                        continue;
                    }
                }
            }
            let accepted = channel.from_host.try_fill(&packet[..pending]);
            if accepted < pending {
                // guard was contended; retry the tail next pass
                packet.copy_within(accepted..pending, 0);
                pending -= accepted;
                Timer::after(PASS_DELAY).await;
            } else {
                pending = 0;
            }
        }

        info!("itf {}: out endpoint down", itf);
    }
}

/// Device-to-host side for the bridge interface: drain `to_host` into
/// the endpoint. Also tracks this interface's terminal state and keeps
/// the host-side coding record current.
#[embassy_executor::task]
pub async fn pump_out(
    itf: usize,
    mut tx: Sender<'static, UsbDriver>,
    ctl: ControlChanged<'static>,
    channel: &'static SerialChannel<CriticalSectionRawMutex>,
) -> ! {
    let max_packet = usize::from(tx.max_packet_size());
    loop {
        tx.wait_connection().await;
        while !tx.dtr() {
            ctl.control_changed().await;
        }
        CONNECTED.set_connected(itf, true);
        info!("itf {}: terminal open", itf);

        loop {
            if !tx.dtr() {
                break;
            }
            channel.coding.set_host(host_coding(&tx.line_coding()));

            let Some(mut drain) = channel.to_host.try_drain() else {
                Timer::after(PASS_DELAY).await;
                continue;
            };
            let n = drain.pending().len().min(max_packet);
            match tx.write_packet(&drain.pending()[..n]).await {
                Ok(()) => {
                    // remove exactly what the transport accepted
                    drain.consume(n);
                    let emptied = drain.pending().is_empty();
                    drop(drain);
                    if emptied && n == max_packet {
                        // flush so the host does not wait for more
                        if tx.write_packet(&[]).await.is_err() {
                            break;
                        }
                    }
                }
                // endpoint went away mid-pump: bytes stay buffered for
                // the next connection
                Err(EndpointError::Disabled) => break,
                Err(EndpointError::BufferOverflow) => unreachable!(),
            }
        }

        CONNECTED.set_connected(itf, false);
        info!("itf {}: terminal closed", itf);
    }
}
