#![no_std]

mod bits;
mod crc;
mod fields;
mod frame;
mod stuff;

// Standard data frame, DLC = 8, reference layout, before stuffing:
// SOF | ID(11) RTR IDE | DLC(4) r r | DATA(64) | CRC(15) | CRC-DEL ACK ACK-DEL | EOF(7)
// 1   + 13             + 6         + 64        + 15      + 3                   + 7 = 109

pub const MAX_DATA_BITS: usize = 64;

/// Largest span ever fed to the CRC register (SOF + arbitration + control + data)
pub const MAX_CRC_SPAN_BITS: usize = 1 + 13 + 6 + MAX_DATA_BITS;

/// Largest frame, start-of-frame through end-of-frame, before stuffing
pub const MAX_UNSTUFFED_BITS: usize = MAX_CRC_SPAN_BITS + 15 + 3 + 7;

/// Capacity of stuffed bitstreams. Worst case is one stuff bit per 4 bits
/// after the first run of 5, plus the 3 bit inter-frame space.
pub const MAX_FRAME_BITS: usize = 160;

pub use bits::*;
pub use crc::*;
pub use fields::*;
pub use frame::*;
pub use stuff::*;

pub use embedded_can::{ExtendedId, Id, StandardId};
