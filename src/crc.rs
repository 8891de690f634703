//! CRC-15 over CAN frame bits.
//!
//! Generator polynomial x^15 + x^14 + x^10 + x^8 + x^7 + x^4 + x^3 + 1.
//! The register shifts MSB-first and takes one bit per step, so it works on
//! spans that are not byte aligned (a base frame's CRC span rarely is).

use crate::bits::{push_value, Bit, BitError, BitVec};

pub const CRC15_POLY: u16 = 0x4599;
pub const CRC15_INIT: u16 = 0x0000;
pub const CRC15_WIDTH: usize = 15;

const CRC15_MASK: u16 = 0x7FFF;

/// Bit-at-a-time CRC-15 register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Crc15 {
    register: u16,
}

impl Default for Crc15 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc15 {
    pub const fn new() -> Self {
        Self {
            register: CRC15_INIT,
        }
    }

    /// Shifts one bit into the register. The bit leaving position 14
    /// decides whether the polynomial is applied.
    pub fn update(&mut self, bit: Bit) {
        let carry = (self.register >> 14) & 1;

        self.register = ((self.register << 1) & CRC15_MASK) | u8::from(bit) as u16;

        if carry != 0 {
            self.register ^= CRC15_POLY;
        }
    }

    pub fn update_bits(&mut self, bits: &[Bit]) {
        bits.iter().for_each(|bit| self.update(*bit));
    }

    /// Current register contents
    pub const fn value(&self) -> u16 {
        self.register
    }

    /// Flushes 15 dominant bits through the register, which yields the
    /// remainder of the message multiplied by x^15. This is the value
    /// ISO 11898 transmits in the CRC field.
    pub fn finish_augmented(mut self) -> u16 {
        (0..CRC15_WIDTH).for_each(|_| self.update(Bit::Dominant));

        self.register
    }
}

/// Register value after shifting in `bits`. An empty sequence yields the
/// initial value.
pub fn compute_crc(bits: &[Bit]) -> u16 {
    let mut crc = Crc15::new();
    crc.update_bits(bits);
    crc.value()
}

/// Standard CRC-15/CAN of `bits`
pub fn compute_crc_augmented(bits: &[Bit]) -> u16 {
    let mut crc = Crc15::new();
    crc.update_bits(bits);
    crc.finish_augmented()
}

/// Renders a CRC as its 15 bit field, MSB first
pub fn crc_bits(crc: u16) -> Result<BitVec<CRC15_WIDTH>, BitError> {
    let mut bits = BitVec::new();
    push_value(&mut bits, crc as u64, CRC15_WIDTH)?;
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use crate::bits::{bits_from_ascii, value_from_bits, Bit, BitVec};

    use super::*;

    #[test]
    fn empty_input_returns_initial_value() {
        assert_eq!(compute_crc(&[]), CRC15_INIT);
        assert_eq!(compute_crc_augmented(&[]), CRC15_INIT);
    }

    #[test]
    fn register_only_reduces_after_fifteen_bits() {
        let ones = [Bit::Recessive; 16];

        assert_eq!(compute_crc(&ones[..15]), 0x7FFF);
        assert_eq!(compute_crc(&ones), 0x3A66);
    }

    #[test]
    fn short_sequence() {
        let bits = bits_from_ascii::<8>(b"1011001").unwrap();

        assert_eq!(compute_crc(&bits), 0x59);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let bits = bits_from_ascii::<32>(b"0010 0100 0110 0100 1101 1110 1010 1101").unwrap();

        let mut crc = Crc15::new();
        bits.chunks(5).for_each(|chunk| crc.update_bits(chunk));

        assert_eq!(crc.value(), compute_crc(&bits));
        assert_eq!(crc.finish_augmented(), compute_crc_augmented(&bits));
    }

    #[test]
    fn augmented_crc_of_iso_reference_frame() {
        // SOF | 0x123 RTR | IDE r0 DLC=4 | 0xDEADBEEF
        let span = bits_from_ascii::<64>(
            b"0 00100100011 0 00 0100 11011110101011011011111011101111",
        )
        .unwrap();

        assert_eq!(compute_crc_augmented(&span), 0x4E6B);
    }

    #[test]
    fn augmented_crc_over_own_field_leaves_zero_remainder() {
        let mut span = bits_from_ascii::<80>(
            b"0 00100100011 0 00 0100 11011110101011011011111011101111",
        )
        .unwrap();
        let field = crc_bits(compute_crc_augmented(&span)).unwrap();
        span.extend_from_slice(&field).unwrap();

        assert_eq!(compute_crc_augmented(&span), 0);
    }

    #[test]
    fn crc_field_rendering() {
        let field: BitVec<CRC15_WIDTH> = crc_bits(0x4E6B).unwrap();

        assert_eq!(field, bits_from_ascii::<15>(b"100111001101011").unwrap());
        assert_eq!(value_from_bits(&field), Ok(0x4E6B));
    }
}
