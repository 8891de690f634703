use embedded_can::StandardId;
use heapless::Vec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    bits::{extend_bits, push_bit, push_value, Bit, BitError, BitVec},
    crc::Crc15,
    stuff::StuffError,
    MAX_CRC_SPAN_BITS, MAX_DATA_BITS,
};

pub const IDENTIFIER_BITS: usize = 11;
pub const DLC_BITS: usize = 4;
pub const ARBITRATION_BITS: usize = IDENTIFIER_BITS + 2;
pub const CONTROL_BITS: usize = DLC_BITS + 2;

/// Remote transmission request bit of a data frame
pub const RTR: Bit = Bit::Dominant;
/// Identifier extension bit of a base (11 bit) frame
pub const IDE: Bit = Bit::Dominant;
/// Reserved control bits as emitted by the [`FrameLayout::Reference`] layout
pub const RESERVED_REFERENCE: Bit = Bit::Recessive;
/// Reserved control bit (r0) as required by ISO 11898
pub const RESERVED_ISO: Bit = Bit::Dominant;

/// Payload byte count of a classic CAN data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = EncodeError, constructor = EncodeError::InvalidDlc))]
#[repr(u8)]
pub enum DataLengthCode {
    Bytes0 = 0,
    Bytes1 = 1,
    Bytes2 = 2,
    Bytes3 = 3,
    Bytes4 = 4,
    Bytes5 = 5,
    Bytes6 = 6,
    Bytes7 = 7,
    Bytes8 = 8,
}

impl DataLengthCode {
    pub const fn num_bytes(self) -> usize {
        self as usize
    }

    /// Width of the data field
    pub const fn num_bits(self) -> usize {
        8 * self.num_bytes()
    }

    /// Whether `payload` can be represented in [`Self::num_bits`] bits
    pub const fn fits(self, payload: u64) -> bool {
        match self.num_bits() {
            MAX_DATA_BITS => true,
            bits => payload >> bits == 0,
        }
    }
}

/// Field order and CRC convention used when laying out a frame.
///
/// `Reference` keeps the field layout and CRC of the legacy frame generator:
/// arbitration is ID + RTR + IDE, the control field carries the DLC followed
/// by two reserved bits set to 1, the CRC register runs over arbitration,
/// control and data without a flush, and stuffing covers start-of-frame
/// through end-of-frame.
///
/// `Iso11898` is the base frame format as a CAN controller transmits it:
/// arbitration is ID + RTR, the control field is IDE + r0 + DLC with r0
/// dominant, the CRC covers start-of-frame through data and is flushed with
/// 15 zero bits, and stuffing stops after the CRC sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameLayout {
    #[default]
    Reference,
    Iso11898,
}

impl FrameLayout {
    /// Whether the CRC span starts with the start-of-frame bit
    pub const fn crc_covers_start_of_frame(self) -> bool {
        matches!(self, Self::Iso11898)
    }

    /// Whether the CRC delimiter, ACK and end-of-frame are run through the
    /// bit stuffer
    pub const fn stuffs_trailer(self) -> bool {
        matches!(self, Self::Reference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    #[error("Identifier ({0:?}) is out of the valid range (0..=0x7FF)")]
    InvalidIdentifier(u16),
    #[error("DLC ({0:?}) is out of the valid range (0..=8)")]
    InvalidDlc(u8),
    #[error("Payload ({payload:#X}) does not fit in {dlc:?} bytes")]
    PayloadOverflow { payload: u64, dlc: u8 },
    #[error("Extended identifier ({0:#X}) cannot be encoded as a base frame")]
    ExtendedIdentifier(u32),
    #[error("Remote frames cannot be encoded")]
    RemoteFrame,
    #[error("Failed to lay out frame bits")]
    Bits(#[from] BitError),
    #[error("Failed to stuff frame bits")]
    Stuffing(#[from] StuffError),
}

/// The logical fields of a base data frame, validated and rendered to bits
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fields {
    layout: FrameLayout,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    identifier: StandardId,
    dlc: DataLengthCode,
    payload: u64,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    arbitration: BitVec<ARBITRATION_BITS>,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    control: BitVec<CONTROL_BITS>,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    data: BitVec<MAX_DATA_BITS>,
}

impl Fields {
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn identifier(&self) -> StandardId {
        self.identifier
    }

    pub fn dlc(&self) -> DataLengthCode {
        self.dlc
    }

    pub fn payload(&self) -> u64 {
        self.payload
    }

    pub fn arbitration(&self) -> &[Bit] {
        &self.arbitration
    }

    pub fn control(&self) -> &[Bit] {
        &self.control
    }

    pub fn data(&self) -> &[Bit] {
        &self.data
    }

    /// The payload as DLC bytes, most significant byte first, ready for a
    /// byte oriented transport
    pub fn data_bytes(&self) -> Vec<u8, 8> {
        let bytes = self.payload.to_be_bytes();

        bytes[bytes.len() - self.dlc.num_bytes()..]
            .iter()
            .copied()
            .collect()
    }

    /// The exact bits the CRC register is fed for this layout
    pub fn crc_span(&self) -> Result<BitVec<MAX_CRC_SPAN_BITS>, BitError> {
        let mut span = BitVec::new();

        if self.layout.crc_covers_start_of_frame() {
            push_bit(&mut span, Bit::Dominant)?;
        }

        extend_bits(&mut span, &self.arbitration)?;
        extend_bits(&mut span, &self.control)?;
        extend_bits(&mut span, &self.data)?;

        Ok(span)
    }

    /// CRC field value for this layout
    pub fn crc(&self) -> u16 {
        let mut crc = Crc15::new();

        if self.layout.crc_covers_start_of_frame() {
            crc.update(Bit::Dominant);
        }

        crc.update_bits(&self.arbitration);
        crc.update_bits(&self.control);
        crc.update_bits(&self.data);

        match self.layout {
            FrameLayout::Reference => crc.value(),
            FrameLayout::Iso11898 => crc.finish_augmented(),
        }
    }

    /// Splits into (arbitration, control, data)
    pub fn into_parts(
        self,
    ) -> (
        BitVec<ARBITRATION_BITS>,
        BitVec<CONTROL_BITS>,
        BitVec<MAX_DATA_BITS>,
    ) {
        (self.arbitration, self.control, self.data)
    }
}

/// Validates the inputs and lays out the arbitration, control and data
/// fields using the default [`FrameLayout`]
pub fn build_fields(identifier: u16, dlc: u8, payload: u64) -> Result<Fields, EncodeError> {
    build_fields_with(FrameLayout::default(), identifier, dlc, payload)
}

pub fn build_fields_with(
    layout: FrameLayout,
    identifier: u16,
    dlc: u8,
    payload: u64,
) -> Result<Fields, EncodeError> {
    let id = StandardId::new(identifier).ok_or(EncodeError::InvalidIdentifier(identifier))?;
    let length = DataLengthCode::try_from(dlc)?;

    if !length.fits(payload) {
        return Err(EncodeError::PayloadOverflow { payload, dlc });
    }

    let mut arbitration = BitVec::new();
    let mut control = BitVec::new();
    let mut data = BitVec::new();

    push_value(&mut arbitration, id.as_raw() as u64, IDENTIFIER_BITS)?;
    push_bit(&mut arbitration, RTR)?;

    match layout {
        FrameLayout::Reference => {
            push_bit(&mut arbitration, IDE)?;
            push_value(&mut control, dlc as u64, DLC_BITS)?;
            push_bit(&mut control, RESERVED_REFERENCE)?;
            push_bit(&mut control, RESERVED_REFERENCE)?;
        }
        FrameLayout::Iso11898 => {
            push_bit(&mut control, IDE)?;
            push_bit(&mut control, RESERVED_ISO)?;
            push_value(&mut control, dlc as u64, DLC_BITS)?;
        }
    }

    push_value(&mut data, payload, length.num_bits())?;

    Ok(Fields {
        layout,
        identifier: id,
        dlc: length,
        payload,
        arbitration,
        control,
        data,
    })
}
