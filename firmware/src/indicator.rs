//! The single status output: steady "host attached" level written by
//! the indicator task, pulsed "capture in progress" written by the
//! capture context. The board has one LED; the two uses overwrite each
//! other, matching the hardware this replaces.

use core::cell::RefCell;

use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Timer};

use crate::pump::CONNECTED;

static LED: Mutex<CriticalSectionRawMutex, RefCell<Option<Output<'static>>>> =
    Mutex::new(RefCell::new(None));

/// Hand the pin over; called once during startup.
pub fn init(led: Output<'static>) {
    LED.lock(|cell| {
        cell.replace(Some(led));
    });
}

/// Drive the indicator. Safe from either core; last write wins.
pub fn set(on: bool) {
    LED.lock(|cell| {
        if let Some(led) = cell.borrow_mut().as_mut() {
            if on {
                led.set_high()
            } else {
                led.set_low()
            }
        }
    });
}

/// Refresh the "any host attached" level once per pass.
#[embassy_executor::task]
pub async fn indicator_task() -> ! {
    loop {
        set(CONNECTED.any());
        Timer::after(Duration::from_millis(10)).await;
    }
}
