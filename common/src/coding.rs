//! Line coding records for the bridged serial interfaces.
//!
//! The host mutates its side through CDC configuration requests; the
//! serial driver compares the two sides to decide whether the peripheral
//! has to be reprogrammed. Values are carried as opaque configuration
//! and never validated.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Serial line parameters as carried by CDC-ACM SET_LINE_CODING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct LineCoding {
    pub baud_rate: u32,
    pub data_bits: u8,
    /// CDC encoding: 0 = one stop bit, 1 = 1.5, 2 = two.
    pub stop_bits: u8,
    /// CDC encoding: 0 = none, 1 = odd, 2 = even, 3 = mark, 4 = space.
    pub parity: u8,
}

impl LineCoding {
    /// 115200 8N1, the assumed power-on state of the serial peripheral.
    pub const fn default_8n1() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: 8,
            stop_bits: 0,
            parity: 0,
        }
    }
}

struct Pair {
    host: LineCoding,
    peripheral: LineCoding,
}

/// Host-side and peripheral-side coding behind one guard.
pub struct LineCodingPair<M: RawMutex> {
    pair: Mutex<M, RefCell<Pair>>,
}

impl<M: RawMutex> LineCodingPair<M> {
    pub const fn new() -> Self {
        Self {
            pair: Mutex::new(RefCell::new(Pair {
                host: LineCoding::default_8n1(),
                peripheral: LineCoding::default_8n1(),
            })),
        }
    }

    /// Overwrite the host side with what the host last requested.
    pub fn set_host(&self, lc: LineCoding) {
        self.pair.lock(|p| p.borrow_mut().host = lc);
    }

    pub fn host(&self) -> LineCoding {
        self.pair.lock(|p| p.borrow().host)
    }

    pub fn peripheral(&self) -> LineCoding {
        self.pair.lock(|p| p.borrow().peripheral)
    }

    /// Whether the peripheral still runs with settings older than the
    /// host's latest request.
    pub fn needs_reapply(&self) -> bool {
        self.pair.lock(|p| {
            let p = p.borrow();
            p.host != p.peripheral
        })
    }

    /// Record that the serial driver reprogrammed the peripheral with
    /// the host's settings.
    pub fn mark_applied(&self) {
        self.pair.lock(|p| {
            let mut p = p.borrow_mut();
            p.peripheral = p.host;
        });
    }
}
