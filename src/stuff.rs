use crate::{
    bits::{push_bit, Bit, BitVec},
    MAX_FRAME_BITS,
};

/// Number of identical consecutive bits after which a complementary bit is
/// inserted
pub const STUFF_RUN_LENGTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StuffError {
    #[error("Tried to stuff or destuff an empty bit sequence")]
    EmptyInput,
    #[error("Bit sequence does not fit the stuffing buffer (capacity {0:?})")]
    CapacityExceeded(usize),
    #[error("Bit at position ({0:?}) should have been a stuff bit but repeats the preceding run")]
    StuffViolation(usize),
}

fn push<const N: usize>(bits: &mut BitVec<N>, bit: Bit) -> Result<(), StuffError> {
    push_bit(bits, bit).map_err(|_| StuffError::CapacityExceeded(N))
}

/// Inserts a complementary bit after every run of [`STUFF_RUN_LENGTH`]
/// identical bits. The inserted bit starts the next run, so a stuff bit can
/// itself be the first bit of a run that gets stuffed.
///
/// A run that is shorter than 5 when the input ends is left untouched.
pub fn stuff(bits: &[Bit]) -> Result<BitVec<MAX_FRAME_BITS>, StuffError> {
    let (&first, _) = bits.split_first().ok_or(StuffError::EmptyInput)?;

    let mut stuffed = BitVec::new();
    let mut last = first;
    let mut run = 0;

    for &bit in bits {
        push(&mut stuffed, bit)?;

        if bit == last {
            run += 1;
        } else {
            last = bit;
            run = 1;
        }

        if run == STUFF_RUN_LENGTH {
            last = bit.flipped();
            run = 1;
            push(&mut stuffed, last)?;
        }
    }

    #[cfg(feature = "defmt")]
    defmt::trace!(
        "Stuffed {} bits into {} bits",
        bits.len(),
        stuffed.len()
    );

    Ok(stuffed)
}

/// Removes the bit that follows every run of [`STUFF_RUN_LENGTH`] identical
/// bits, recovering exactly what [`stuff`] was given.
///
/// A bit in stuff position that repeats the run is a stuff error on the bus
/// and is reported with its position in `bits`.
pub fn destuff(bits: &[Bit]) -> Result<BitVec<MAX_FRAME_BITS>, StuffError> {
    let (&first, _) = bits.split_first().ok_or(StuffError::EmptyInput)?;

    let mut destuffed = BitVec::new();
    let mut last = first;
    let mut run = 0;
    let mut stuff_pending = false;

    for (position, &bit) in bits.iter().enumerate() {
        if stuff_pending {
            if bit == last {
                #[cfg(feature = "defmt")]
                defmt::debug!("Stuff violation at bit {}", position);

                return Err(StuffError::StuffViolation(position));
            }

            stuff_pending = false;
            last = bit;
            run = 1;
            continue;
        }

        push(&mut destuffed, bit)?;

        if bit == last {
            run += 1;
        } else {
            last = bit;
            run = 1;
        }

        stuff_pending = run == STUFF_RUN_LENGTH;
    }

    Ok(destuffed)
}

/// Length of the longest run of identical consecutive bits
pub fn longest_run(bits: &[Bit]) -> usize {
    bits.chunk_by(|a, b| a == b)
        .map(|run| run.len())
        .max()
        .unwrap_or(0)
}
