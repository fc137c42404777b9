//! USB device assembly: one composite device carrying the three CDC-ACM
//! interfaces, plus the endpoint write helper shared by the capture and
//! pump paths.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_rp::{bind_interrupts, Peri};
use embassy_usb::class::cdc_acm::{CdcAcmClass, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::UsbDevice;
use picoscope_common::static_byte_buffer;
use static_cell::StaticCell;

bind_interrupts!(pub struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

pub type UsbDriver = Driver<'static, USB>;

pub const VID: u16 = 0x2e8a;
pub const PID: u16 = 0x000a;

/// Number of CDC interfaces exposed to the host.
pub const NUM_INTERFACES: usize = 3;

/// Interface 0: raw capture sets, device to host.
pub const ITF_CAPTURE: usize = 0;
/// Interface 1: best-effort text diagnostics.
pub const ITF_DIAG: usize = 1;
/// Interface 2: bridged serial port.
pub const ITF_BRIDGE: usize = 2;

pub const MAX_PACKET_SIZE: u16 = 64;

#[embassy_executor::task]
pub async fn run_usb(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Build the composite USB device and its CDC-ACM classes.
///
/// Panics if called more than once.
pub fn usb_device(
    usb: Peri<'static, USB>,
) -> (
    UsbDevice<'static, UsbDriver>,
    [CdcAcmClass<'static, UsbDriver>; NUM_INTERFACES],
) {
    let driver = Driver::new(usb, Irqs);

    let mut config = embassy_usb::Config::new(VID, PID);
    config.manufacturer = Some("picoscope");
    config.product = Some("ADC scope + serial bridge");
    config.serial_number = Some("00000001");
    config.max_power = 100;
    config.max_packet_size_0 = 64;

    // Required for windows compatibility: multi-function CDC needs IADs.
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;

    let config_descriptor = static_byte_buffer!(256);
    let bos_descriptor = static_byte_buffer!(256);
    let msos_descriptor = static_byte_buffer!(256);
    let control_buf = static_byte_buffer!(64);

    let mut builder = embassy_usb::Builder::new(
        driver,
        config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    static STATES: StaticCell<[State<'static>; NUM_INTERFACES]> = StaticCell::new();
    let [capture_state, diag_state, bridge_state] =
        STATES.init([State::new(), State::new(), State::new()]);

    let classes = [
        CdcAcmClass::new(&mut builder, capture_state, MAX_PACKET_SIZE),
        CdcAcmClass::new(&mut builder, diag_state, MAX_PACKET_SIZE),
        CdcAcmClass::new(&mut builder, bridge_state, MAX_PACKET_SIZE),
    ];

    let device = builder.build();
    (device, classes)
}

/// Write a full payload as max-packet chunks, closing with a zero-length
/// packet when the payload is an exact multiple of the packet size so
/// the host does not sit on an open transfer.
pub async fn write_all(
    sender: &mut Sender<'static, UsbDriver>,
    data: &[u8],
) -> Result<(), EndpointError> {
    let max_packet = usize::from(sender.max_packet_size());
    for chunk in data.chunks(max_packet) {
        sender.write_packet(chunk).await?;
    }
    if data.len() % max_packet == 0 {
        sender.write_packet(&[]).await?;
    }
    Ok(())
}
