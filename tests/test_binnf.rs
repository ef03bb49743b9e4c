//! Integration tests for the binnf codec.
//!
//! Tests verify:
//! - Byte layout of encoded blocks
//! - Round-trips of matrix and log blocks
//! - String length limits
//! - Resynchronisation after corrupt or foreign bytes

use proptest::prelude::*;
use spikeport::binnf::{self, BlockReader, BlockWriter, MAX_STRING_LEN};
use spikeport::{Block, Header, LogRecord, Matrix, NumericType, Severity, SpikeportError};

fn sample_block() -> Block {
    let header = Header::new([("a", NumericType::Int32), ("b", NumericType::Float32)]);
    let mut matrix = Matrix::new(header, 2);
    matrix.set(0, 0, 1i32);
    matrix.set(0, 1, 1.5f32);
    matrix.set(1, 0, -2i32);
    matrix.set(1, 1, 0.0f32);
    Block::matrix("t", matrix)
}

fn second_block() -> Block {
    let mut matrix = Matrix::new(Header::new([("times", NumericType::Float64)]), 3);
    for (row, t) in [10.0f64, 20.0, 30.0].into_iter().enumerate() {
        matrix.set(row, 0, t);
    }
    Block::matrix("spike_times", matrix)
}

#[test]
fn test_trivial_matrix_round_trip() {
    let block = sample_block();
    let bytes = binnf::encode(&block).unwrap();

    assert_eq!(&bytes[..4], &[0xDA, 0x8C, 0x5A, 0x66]);
    assert_eq!(&bytes[bytes.len() - 4..], &[0xCB, 0x62, 0x00, 0x42]);
    assert_eq!(bytes.len() as u64, binnf::block_len(&block) + 12);

    let (blocks, diagnostics) = binnf::decode_all(&bytes);
    assert!(diagnostics.is_empty());
    let decoded = blocks[0].as_matrix().unwrap();
    assert_eq!(decoded.name, "t");
    assert_eq!(decoded.matrix.header().name(1), "b");
    assert_eq!(decoded.matrix.get::<i32>(1, 0), -2);
    assert_eq!(decoded.matrix.get::<f32>(0, 1), 1.5);
    assert_eq!(blocks, vec![block]);
}

#[test]
fn test_log_block_layout() {
    let log = Block::Log(LogRecord::new(1.25, Severity::Warning, "nest", "slow"));
    let bytes = binnf::encode(&log).unwrap();
    // start, length, type, time, severity
    assert_eq!(&bytes[8..12], &2u32.to_le_bytes());
    assert_eq!(&bytes[12..20], &1.25f64.to_le_bytes());
    assert_eq!(&bytes[20..24], &30u32.to_le_bytes());
    assert_eq!(binnf::decode_all(&bytes).0, vec![log]);
}

#[test]
fn test_oversized_string_rejected_on_encode() {
    let name = "x".repeat(MAX_STRING_LEN + 1);
    let block = Block::matrix(name, Matrix::new(Header::default(), 0));
    assert!(matches!(
        binnf::encode(&block),
        Err(SpikeportError::OversizedString { length: 1025, limit: 1024 })
    ));

    // Nothing reaches the sink
    let mut writer = BlockWriter::new(Vec::new());
    assert!(writer.write_block(&block).is_err());
    assert!(writer.into_inner().is_empty());
}

#[test]
fn test_oversized_string_rejected_on_decode() {
    let block = Block::matrix("n", Matrix::new(Header::default(), 0));
    let mut bytes = binnf::encode(&block).unwrap();
    // name length follows start, length and type
    bytes[12..16].copy_from_slice(&1025u32.to_le_bytes());
    let (blocks, diagnostics) = binnf::decode_all(&bytes);
    assert!(blocks.is_empty());
    assert!(matches!(
        diagnostics[0],
        SpikeportError::OversizedString { length: 1025, .. }
    ));
}

#[test]
fn test_max_length_string_accepted() {
    let message = "m".repeat(MAX_STRING_LEN);
    let log = Block::Log(LogRecord::new(0.0, Severity::Info, "", message));
    let bytes = binnf::encode(&log).unwrap();
    assert_eq!(binnf::decode_all(&bytes).0, vec![log]);
}

#[test]
fn test_non_utf8_strings_round_trip_exactly() {
    let header = Header::new([(vec![b'c', 0xC0], NumericType::UInt8)]);
    let block = Block::matrix(vec![0xFF], Matrix::new(header, 1));
    let log = Block::Log(LogRecord::new(
        2.0,
        Severity::Error,
        vec![0x80, b'm'],
        vec![0xFE, 0xFF, 0x00],
    ));
    let bytes = binnf::encode_all([&block, &log]).unwrap();
    // name length 1, then the single raw byte
    assert_eq!(&bytes[12..17], &[1, 0, 0, 0, 0xFF]);

    let (blocks, diagnostics) = binnf::decode_all(&bytes);
    assert!(diagnostics.is_empty());
    assert_eq!(blocks, vec![block, log]);
    assert_eq!(blocks[0].name(), None);
    assert_eq!(blocks[0].raw_name().unwrap().as_bytes(), &[0xFF]);
    assert_eq!(blocks[1].as_log().unwrap().message.as_bytes(), &[0xFE, 0xFF, 0x00]);
    assert_eq!(binnf::loopback(&bytes).unwrap(), bytes);
}

#[test]
fn test_loopback_keeps_long_binary_strings() {
    let block = Block::matrix(vec![0xFF; 400], Matrix::new(Header::default(), 0));
    let log = Block::Log(LogRecord::new(
        0.0,
        Severity::Info,
        vec![0xFF; MAX_STRING_LEN],
        vec![0xC3; MAX_STRING_LEN],
    ));
    let bytes = binnf::encode_all([&block, &log]).unwrap();
    assert_eq!(binnf::loopback(&bytes).unwrap(), bytes);
}

#[test]
fn test_resync_across_corruption() {
    let b1 = sample_block();
    let b2 = second_block();

    let mut bytes: Vec<u8> = (0u8..17).map(|i| i.wrapping_mul(37)).collect();
    bytes.extend(binnf::encode(&b1).unwrap());
    bytes.push(0xFF);
    bytes.extend(binnf::encode(&b2).unwrap());

    let items: Vec<_> = BlockReader::new(&bytes[..]).collect();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap(), &b1);
    assert!(matches!(items[1], Err(SpikeportError::SkippedBytes { count: 1 })));
    assert_eq!(items[2].as_ref().unwrap(), &b2);
}

#[test]
fn test_end_marker_mismatch_skips_block() {
    let b1 = sample_block();
    let b2 = second_block();
    let mut bytes = binnf::encode(&b1).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    bytes.extend(binnf::encode(&b2).unwrap());

    let (blocks, diagnostics) = binnf::decode_all(&bytes);
    assert_eq!(blocks, vec![b2]);
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(diagnostics[0], SpikeportError::EndMarkerMismatch { .. }));
    assert!(diagnostics[0].is_recoverable());
}

#[test]
fn test_writer_counts_blocks() {
    let mut writer = BlockWriter::new(Vec::new());
    writer.write_block(&sample_block()).unwrap();
    writer.write_block(&second_block()).unwrap();
    assert_eq!(writer.blocks_written(), 2);
    let bytes = writer.into_inner();

    let mut reader = BlockReader::new(&bytes[..]);
    assert!(reader.by_ref().all(|item| item.is_ok()));
    assert_eq!(reader.blocks_read(), 2);
}

#[test]
fn test_loopback_drops_corrupt_blocks() {
    let mut bytes = binnf::encode(&sample_block()).unwrap();
    bytes[8] = 7;
    bytes.extend(binnf::encode(&second_block()).unwrap());
    let echoed = binnf::loopback(&bytes).unwrap();
    assert_eq!(binnf::decode_all(&echoed).0, vec![second_block()]);
}

// ===== Property-Based Tests =====

fn numeric_type() -> impl Strategy<Value = NumericType> {
    prop::sample::select(NumericType::ALL.to_vec())
}

fn severity() -> impl Strategy<Value = Severity> {
    prop::sample::select(Severity::ALL.to_vec())
}

prop_compose! {
    fn matrix_block()(
        name in prop::collection::vec(any::<u8>(), 0..16),
        columns in prop::collection::vec((prop::collection::vec(any::<u8>(), 1..8), numeric_type()), 0..6),
        rows in 0usize..8,
    )(
        data in prop::collection::vec(any::<u8>(), rows * Header::new(columns.clone()).stride()),
        name in Just(name),
        columns in Just(columns),
        rows in Just(rows),
    ) -> Block {
        let header = Header::new(columns);
        Block::matrix(name, Matrix::from_bytes(header, rows, data).unwrap())
    }
}

proptest! {
    #[test]
    fn prop_matrix_block_round_trip(block in matrix_block()) {
        let bytes = binnf::encode(&block).unwrap();
        let (blocks, diagnostics) = binnf::decode_all(&bytes);
        prop_assert!(diagnostics.is_empty());
        prop_assert_eq!(blocks, vec![block]);
    }

    #[test]
    fn prop_log_block_round_trip(
        time in any::<f64>().prop_filter("NaN never compares equal", |t| !t.is_nan()),
        severity in severity(),
        module in prop::collection::vec(any::<u8>(), 0..=1024),
        message in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let log = Block::Log(LogRecord::new(time, severity, module, message));
        let bytes = binnf::encode(&log).unwrap();
        prop_assert_eq!(binnf::decode_all(&bytes).0, vec![log]);
    }

    #[test]
    fn prop_resync_after_prefix(
        prefix in prop::collection::vec(any::<u8>(), 0..64),
        suffix in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let marker = binnf::START_MARKER.to_le_bytes();
        prop_assume!(!prefix.windows(4).any(|w| w == marker));
        prop_assume!(!suffix.windows(4).any(|w| w == marker));

        let block = second_block();
        let mut bytes = prefix;
        bytes.extend(binnf::encode(&block).unwrap());
        bytes.extend(suffix);

        let (blocks, diagnostics) = binnf::decode_all(&bytes);
        prop_assert_eq!(blocks, vec![block]);
        prop_assert!(diagnostics.len() <= 1);
    }

    #[test]
    fn prop_single_byte_corruption_spares_next_block(offset in any::<prop::sample::Index>(), flip in 1u8..=255) {
        let b1 = sample_block();
        let b2 = second_block();
        let mut bytes = binnf::encode(&b1).unwrap();
        // body only: after start marker and length, before the end marker
        let body = 8..bytes.len() - 4;
        let at = body.start + offset.index(body.len());
        bytes[at] ^= flip;
        let damaged = bytes.clone();
        bytes.extend(binnf::encode(&b2).unwrap());

        let (blocks, _) = binnf::decode_all(&bytes);
        prop_assert_eq!(blocks.last(), Some(&b2));
        if blocks.len() == 2 {
            // still decodable: the block comes back exactly as it was on the wire
            prop_assert_eq!(binnf::encode(&blocks[0]).unwrap(), damaged);
        } else {
            prop_assert_eq!(blocks.len(), 1);
        }
    }
}
