use embedded_can::{Frame, Id, StandardId};

use crate::{
    bits::{extend_bits, push_bit, push_repeated, Bit, BitError, BitVec},
    crc::crc_bits,
    fields::{build_fields, build_fields_with, DataLengthCode, EncodeError, Fields, FrameLayout},
    stuff::stuff,
    MAX_FRAME_BITS, MAX_UNSTUFFED_BITS,
};

pub const START_OF_FRAME: Bit = Bit::Dominant;
pub const CRC_DELIMITER: Bit = Bit::Recessive;
/// The transmitter leaves the ACK slot recessive, receivers overwrite it
pub const ACK_SLOT: Bit = Bit::Recessive;
pub const ACK_DELIMITER: Bit = Bit::Recessive;
pub const END_OF_FRAME_BITS: usize = 7;
pub const INTERFRAME_SPACE_BITS: usize = 3;

/// CRC delimiter, ACK slot, ACK delimiter and end-of-frame
fn push_trailer<const N: usize>(bits: &mut BitVec<N>) -> Result<(), BitError> {
    push_bit(bits, CRC_DELIMITER)?;
    push_bit(bits, ACK_SLOT)?;
    push_bit(bits, ACK_DELIMITER)?;
    push_repeated(bits, Bit::Recessive, END_OF_FRAME_BITS)
}

/// A frame as it appears on the wire, from start-of-frame through the
/// inter-frame space, together with the CRC that was transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodedFrame {
    layout: FrameLayout,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    bits: BitVec<MAX_FRAME_BITS>,
    crc: u16,
}

impl EncodedFrame {
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// The full bitstream, inter-frame space included
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Start-of-frame through end-of-frame
    pub fn stuffed(&self) -> &[Bit] {
        &self.bits[..self.bits.len() - INTERFRAME_SPACE_BITS]
    }

    pub fn interframe_space(&self) -> &[Bit] {
        &self.bits[self.bits.len() - INTERFRAME_SPACE_BITS..]
    }

    pub fn crc(&self) -> u16 {
        self.crc
    }

    /// Splits into (bitstream, crc)
    pub fn into_parts(self) -> (BitVec<MAX_FRAME_BITS>, u16) {
        (self.bits, self.crc)
    }
}

/// Encodes a base data frame with the default [`FrameLayout`]
pub fn encode_frame(identifier: u16, dlc: u8, payload: u64) -> Result<EncodedFrame, EncodeError> {
    encode_fields(&build_fields(identifier, dlc, payload)?)
}

pub fn encode_frame_with(
    layout: FrameLayout,
    identifier: u16,
    dlc: u8,
    payload: u64,
) -> Result<EncodedFrame, EncodeError> {
    encode_fields(&build_fields_with(layout, identifier, dlc, payload)?)
}

/// Appends the CRC and the fixed trailing fields to already built fields,
/// stuffs the result and terminates it with the inter-frame space
pub fn encode_fields(fields: &Fields) -> Result<EncodedFrame, EncodeError> {
    let layout = fields.layout();
    let crc = fields.crc();

    let mut unstuffed = BitVec::<MAX_UNSTUFFED_BITS>::new();

    push_bit(&mut unstuffed, START_OF_FRAME)?;
    extend_bits(&mut unstuffed, fields.arbitration())?;
    extend_bits(&mut unstuffed, fields.control())?;
    extend_bits(&mut unstuffed, fields.data())?;
    extend_bits(&mut unstuffed, &crc_bits(crc)?)?;

    if layout.stuffs_trailer() {
        push_trailer(&mut unstuffed)?;
    }

    let mut bits = stuff(&unstuffed)?;

    if !layout.stuffs_trailer() {
        push_trailer(&mut bits)?;
    }

    push_repeated(&mut bits, Bit::Recessive, INTERFRAME_SPACE_BITS)?;

    #[cfg(feature = "defmt")]
    defmt::trace!(
        "Encoded frame {:?}: crc {=u16:#x}, {} bits ({} before stuffing)",
        layout,
        crc,
        bits.len(),
        unstuffed.len()
    );

    Ok(EncodedFrame { layout, bits, crc })
}

/// A validated base data frame in the byte oriented form a CAN driver
/// transmits. Implements [`embedded_can::Frame`] so it can be handed to any
/// driver, and can be encoded into its wire bits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataFrame {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: StandardId,
    dlc: DataLengthCode,
    data: [u8; 8],
}

impl DataFrame {
    /// Creates a new data frame. `data` must have a length in the range
    /// 0..=8 or else `None` will be returned instead.
    pub fn new_data(id: StandardId, data: &[u8]) -> Option<Self> {
        let dlc = DataLengthCode::try_from(u8::try_from(data.len()).ok()?).ok()?;

        let mut copy = [0u8; 8];
        copy[..data.len()].copy_from_slice(data);

        Some(Self { id, dlc, data: copy })
    }

    /// Creates a data frame from an identifier, a DLC and a payload whose
    /// width is exactly `8 * dlc` bits
    pub fn from_parts(identifier: u16, dlc: u8, payload: u64) -> Result<Self, EncodeError> {
        Ok(Self::from(&build_fields(identifier, dlc, payload)?))
    }

    pub fn standard_id(&self) -> StandardId {
        self.id
    }

    pub fn data_length_code(&self) -> DataLengthCode {
        self.dlc
    }

    /// The data bytes read as one big-endian integer
    pub fn payload(&self) -> u64 {
        payload_from_bytes(self.data())
    }

    pub fn fields_with(&self, layout: FrameLayout) -> Result<Fields, EncodeError> {
        build_fields_with(layout, self.id.as_raw(), self.dlc.into(), self.payload())
    }

    pub fn encode(&self) -> Result<EncodedFrame, EncodeError> {
        self.encode_with(FrameLayout::default())
    }

    pub fn encode_with(&self, layout: FrameLayout) -> Result<EncodedFrame, EncodeError> {
        encode_fields(&self.fields_with(layout)?)
    }
}

impl From<&Fields> for DataFrame {
    fn from(fields: &Fields) -> Self {
        let mut data = [0u8; 8];
        let bytes = fields.data_bytes();
        data[..bytes.len()].copy_from_slice(&bytes);

        Self {
            id: fields.identifier(),
            dlc: fields.dlc(),
            data,
        }
    }
}

impl Frame for DataFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => Self::new_data(id, data),
            Id::Extended(_) => None,
        }
    }

    /// Remote frames are never produced
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        Id::Standard(self.id)
    }

    fn dlc(&self) -> usize {
        self.dlc.num_bytes()
    }

    fn data(&self) -> &[u8] {
        &self.data[..self.dlc.num_bytes()]
    }
}

fn payload_from_bytes(data: &[u8]) -> u64 {
    data.iter()
        .fold(0u64, |payload, byte| (payload << 8) | *byte as u64)
}

/// Encodes any driver frame. Only standard data frames can be represented.
pub fn encode_can_frame<F: Frame>(
    frame: &F,
    layout: FrameLayout,
) -> Result<EncodedFrame, EncodeError> {
    let id = match frame.id() {
        Id::Standard(id) => id,
        Id::Extended(id) => return Err(EncodeError::ExtendedIdentifier(id.as_raw())),
    };

    if frame.is_remote_frame() {
        return Err(EncodeError::RemoteFrame);
    }

    let data = frame.data();
    let dlc = u8::try_from(data.len()).unwrap_or(u8::MAX);

    encode_frame_with(layout, id.as_raw(), dlc, payload_from_bytes(data))
}
