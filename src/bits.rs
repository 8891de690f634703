use core::fmt;

use heapless::Vec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A single bus level. The integer value of each variant is the logic value
/// seen on the wire, so a dominant bit always wins arbitration over a
/// recessive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = BitError, constructor = BitError::IllegalBitValue))]
#[repr(u8)]
pub enum Bit {
    Dominant = 0,
    Recessive = 1,
}

impl Bit {
    /// The complementary level, used as the stuff bit after a run
    pub const fn flipped(self) -> Self {
        match self {
            Self::Dominant => Self::Recessive,
            Self::Recessive => Self::Dominant,
        }
    }

    /// Takes the least significant bit of `value`
    pub const fn from_lsb(value: u64) -> Self {
        if value & 1 == 0 {
            Self::Dominant
        } else {
            Self::Recessive
        }
    }
}

impl From<bool> for Bit {
    fn from(recessive: bool) -> Self {
        if recessive {
            Self::Recessive
        } else {
            Self::Dominant
        }
    }
}

/// Fixed-capacity, ordered bit sequence. Frames never exceed a few hundred
/// bits so everything lives on the stack.
pub type BitVec<const N: usize> = Vec<Bit, N>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitError {
    #[error("Tried to convert a value ({0:?}) into a bit but it was neither 0 nor 1")]
    IllegalBitValue(u8),
    #[error("Tried to decode a bit digit but it was out of range ({0:?})")]
    IllegalBitDigit(u8),
    #[error("Requested a field width ({0:?}) wider than 64 bits")]
    WidthTooLarge(usize),
    #[error("Bit buffer is full (capacity {0:?})")]
    CapacityExceeded(usize),
}

/* Encoding */

pub fn push_bit<const N: usize>(bits: &mut BitVec<N>, bit: Bit) -> Result<(), BitError> {
    bits.push(bit).map_err(|_| BitError::CapacityExceeded(N))
}

/// Appends the low `width` bits of `value`, most significant bit first.
/// Bits of `value` above `width` are ignored, range checks belong to the
/// caller.
pub fn push_value<const N: usize>(
    bits: &mut BitVec<N>,
    value: u64,
    width: usize,
) -> Result<(), BitError> {
    if width > 64 {
        return Err(BitError::WidthTooLarge(width));
    }

    (0..width)
        .rev()
        .try_for_each(|shift| push_bit(bits, Bit::from_lsb(value >> shift)))
}

pub fn push_repeated<const N: usize>(
    bits: &mut BitVec<N>,
    bit: Bit,
    count: usize,
) -> Result<(), BitError> {
    (0..count).try_for_each(|_| push_bit(bits, bit))
}

pub fn extend_bits<const N: usize>(bits: &mut BitVec<N>, other: &[Bit]) -> Result<(), BitError> {
    bits.extend_from_slice(other)
        .map_err(|_| BitError::CapacityExceeded(N))
}

/// Renders bits as a string of `0` and `1` characters
#[derive(Debug, Clone, Copy)]
pub struct BitDisplay<'a>(pub &'a [Bit]);

impl fmt::Display for BitDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|bit| match bit {
            Bit::Dominant => f.write_str("0"),
            Bit::Recessive => f.write_str("1"),
        })
    }
}

/* Decoding */

/// Reads MSB-first bits back into an integer
pub fn value_from_bits(bits: &[Bit]) -> Result<u64, BitError> {
    if bits.len() > 64 {
        return Err(BitError::WidthTooLarge(bits.len()));
    }

    Ok(bits
        .iter()
        .fold(0u64, |value, bit| (value << 1) | u8::from(*bit) as u64))
}

pub fn bit_from_ascii(byte: u8) -> Result<Bit, BitError> {
    Ok(match byte {
        b'0' => Bit::Dominant,
        b'1' => Bit::Recessive,
        _ => return Err(BitError::IllegalBitDigit(byte)),
    })
}

/// Parses `0`/`1` text into bits. ASCII whitespace is skipped so long
/// streams can be grouped by field.
pub fn bits_from_ascii<const N: usize>(text: &[u8]) -> Result<BitVec<N>, BitError> {
    let mut bits = Vec::new();

    text.iter()
        .filter(|byte| !byte.is_ascii_whitespace())
        .try_for_each(|byte| push_bit(&mut bits, bit_from_ascii(*byte)?))?;

    Ok(bits)
}
