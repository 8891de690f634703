//! End-to-end encoding of base data frames through the public API.

use canbits::{
    build_fields, compute_crc, destuff, encode_can_frame, encode_frame, encode_frame_with,
    longest_run, stuff, Bit, BitDisplay, DataFrame, EncodeError, FrameLayout, StuffError,
    STUFF_RUN_LENGTH,
};
use embedded_can::{Frame, StandardId};

fn render(bits: &[Bit]) -> String {
    BitDisplay(bits).to_string()
}

#[test]
fn legacy_generator_vector() {
    let (bitstream, crc) = encode_frame(0x123, 4, 0xDEAD_BEEF).unwrap().into_parts();

    assert_eq!(crc, 0x567A);
    assert_eq!(
        render(&bitstream),
        "000100100011000100111101111010101101101111100111011111001011001111010111110111110111"
    );
}

#[test]
fn iso_vector_matches_expected_crc() {
    let frame = encode_frame_with(FrameLayout::Iso11898, 0x123, 4, 0xDEAD_BEEF).unwrap();
    let rendered = render(frame.bits());

    assert_eq!(frame.crc(), 0x4E6B);
    assert!(rendered.starts_with('0'));
    assert!(rendered.ends_with("111"));
}

#[test]
fn crc_is_reproducible() {
    let fields = build_fields(0x555, 8, 0x0123_4567_89AB_CDEF).unwrap();
    let span = fields.crc_span().unwrap();

    let first = compute_crc(&span);
    let second = compute_crc(&span);

    assert_eq!(first, second);
    assert_eq!(first, fields.crc());
    assert_eq!(
        encode_frame(0x555, 8, 0x0123_4567_89AB_CDEF).unwrap().crc(),
        first
    );
}

#[test]
fn every_identifier_stays_within_run_limit() {
    for identifier in (0..=0x7FF).step_by(7) {
        let frame = encode_frame(identifier, 2, 0xF00F).unwrap();

        assert!(longest_run(frame.stuffed()) <= STUFF_RUN_LENGTH);
        assert_eq!(frame.bits()[0], Bit::Dominant);
        assert_eq!(render(frame.interframe_space()), "111");
    }
}

#[test]
fn every_dlc_round_trips_through_destuff() {
    for dlc in 0..=8u8 {
        let payload = if dlc == 8 {
            u64::MAX
        } else {
            (1u64 << (8 * dlc as u32)) - 1
        };

        let frame = encode_frame(0x7FF, dlc, payload).unwrap();
        let raw = destuff(frame.stuffed()).unwrap();

        assert_eq!(raw.len(), 1 + 13 + 6 + 8 * dlc as usize + 15 + 3 + 7);
        assert_eq!(stuff(&raw).unwrap(), frame.stuffed());
    }
}

#[test]
fn stuffing_errors() {
    assert_eq!(stuff(&[]), Err(StuffError::EmptyInput));
    assert_eq!(
        destuff(&[Bit::Recessive; 6]),
        Err(StuffError::StuffViolation(5))
    );
}

#[test]
fn validation_scenarios() {
    assert_eq!(
        encode_frame(2048, 0, 0),
        Err(EncodeError::InvalidIdentifier(2048))
    );
    assert_eq!(encode_frame(0, 9, 0), Err(EncodeError::InvalidDlc(9)));
    assert_eq!(
        encode_frame(0, 1, 0x100),
        Err(EncodeError::PayloadOverflow {
            payload: 0x100,
            dlc: 1
        })
    );

    let error = encode_frame(0, 9, 0).unwrap_err();
    assert_eq!(error.to_string(), "DLC (9) is out of the valid range (0..=8)");
}

#[test]
fn driver_handoff() {
    let id = StandardId::new(0x123).unwrap();
    let frame = DataFrame::new(id, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

    assert_eq!(frame.payload(), 0xDEAD_BEEF);
    assert_eq!(
        encode_can_frame(&frame, FrameLayout::Reference),
        encode_frame(0x123, 4, 0xDEAD_BEEF)
    );
    assert_eq!(
        build_fields(0x123, 4, 0xDEAD_BEEF).unwrap().data_bytes(),
        frame.data()
    );
}
