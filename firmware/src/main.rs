//! Dual-core bring-up: core 0 owns the capture pipeline, core 1 owns
//! the USB device and everything that pumps bytes for it. The two sides
//! share nothing but the channel table and the status indicator.

#![no_std]
#![no_main]

mod diag;
mod indicator;
mod pump;
mod sampler;
mod usb;

use defmt::info;
use embassy_executor::Executor;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_time::{block_for, Duration};
use picoscope_common::sampling::N_SAMPLES;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use crate::usb::{ITF_BRIDGE, ITF_CAPTURE, ITF_DIAG};

bind_interrupts!(struct AdcIrqs {
    ADC_IRQ_FIFO => embassy_rp::adc::InterruptHandler;
});

static mut CORE1_STACK: Stack<8192> = Stack::new();
static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();
static SAMPLE_BUF: ConstStaticCell<[u8; N_SAMPLES]> = ConstStaticCell::new([0; N_SAMPLES]);

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = embassy_rp::init(Default::default());
    info!("booting");

    // boot indication on the shared LED before anyone else claims it
    let mut led = Output::new(p.PIN_25, Level::Low);
    for _ in 0..10 {
        led.set_high();
        block_for(Duration::from_millis(100));
        led.set_low();
        block_for(Duration::from_millis(100));
    }
    indicator::init(led);

    let adc = Adc::new(p.ADC, AdcIrqs, AdcConfig::default());
    // GPIO26 is ADC channel 0, the capture input
    let input = Channel::new_pin(p.PIN_26, Pull::None);
    // let the analog front end settle before the first conversion
    block_for(Duration::from_millis(1000));

    let (device, [capture_class, diag_class, bridge_class]) = usb::usb_device(p.USB);
    let (capture_tx, capture_rx, capture_ctl) = capture_class.split_with_control();
    let (diag_tx, diag_rx, diag_ctl) = diag_class.split_with_control();
    let (bridge_tx, bridge_rx, bridge_ctl) = bridge_class.split_with_control();

    let sample_buf = SAMPLE_BUF.take();

    // Core 1: the USB device state machine and every byte pump. The
    // device task must keep running; nothing on this core blocks.
    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| {
                spawner.must_spawn(usb::run_usb(device));
                spawner.must_spawn(pump::pump_in(
                    ITF_CAPTURE,
                    capture_rx,
                    &pump::CHANNELS[ITF_CAPTURE],
                ));
                spawner.must_spawn(pump::pump_in(ITF_DIAG, diag_rx, &pump::CHANNELS[ITF_DIAG]));
                spawner.must_spawn(pump::pump_in(
                    ITF_BRIDGE,
                    bridge_rx,
                    &pump::CHANNELS[ITF_BRIDGE],
                ));
                spawner.must_spawn(pump::pump_out(
                    ITF_BRIDGE,
                    bridge_tx,
                    bridge_ctl,
                    &pump::CHANNELS[ITF_BRIDGE],
                ));
                spawner.must_spawn(diag::diag_task(diag_tx, diag_ctl));
                spawner.must_spawn(indicator::indicator_task());
            });
        },
    );

    // Core 0: the capture/publish loop and nothing else.
    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(|spawner| {
        spawner.must_spawn(sampler::capture_publish(
            adc,
            input,
            p.DMA_CH0,
            capture_tx,
            capture_ctl,
            sample_buf,
        ));
    })
}
