// Integration tests for dcmflow
#[cfg(test)]
mod tests {
  const RNG_SEED: u64 = 1023;

  const UNDEFINED: u32 = 0xFFFFFFFF;

  use std::io::Write;

  use flate2::write::{DeflateEncoder, ZlibEncoder};
  use flate2::Compression;
  use rand::rngs::SmallRng;
  use rand::seq::SliceRandom;
  use rand::{Rng, SeedableRng};

  use dcmflow_core::*;
  use dcmflow_p10::flows::*;
  use dcmflow_p10::*;

  /// Returns the header of an explicit VR little endian data element.
  ///
  fn header(group: u16, element: u16, vr: &[u8; 2], length: u32) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&group.to_le_bytes());
    bytes.extend_from_slice(&element.to_le_bytes());
    bytes.extend_from_slice(vr);

    if matches!(vr, b"OB" | b"OW" | b"SQ" | b"UN" | b"UT") {
      bytes.extend_from_slice(&[0, 0]);
      bytes.extend_from_slice(&length.to_le_bytes());
    } else {
      bytes.extend_from_slice(&(length as u16).to_le_bytes());
    }

    bytes
  }

  fn element(group: u16, element: u16, vr: &[u8; 2], value: &[u8]) -> Vec<u8> {
    let mut bytes = header(group, element, vr, value.len() as u32);
    bytes.extend_from_slice(value);
    bytes
  }

  /// Returns an item, item delimitation or sequence delimitation.
  ///
  fn control(element: u16, length: u32) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend_from_slice(&element.to_le_bytes());
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes
  }

  /// Returns a File Preamble followed by File Meta Information that specifies
  /// the given transfer syntax.
  ///
  fn file_meta(transfer_syntax_uid: &str) -> Vec<u8> {
    let mut uid = transfer_syntax_uid.as_bytes().to_vec();
    if uid.len() % 2 == 1 {
      uid.push(0);
    }

    let body = element(0x0002, 0x0010, b"UI", &uid);

    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    bytes.extend(element(
      0x0002,
      0x0000,
      b"UL",
      &(body.len() as u32).to_le_bytes(),
    ));
    bytes.extend(body);

    bytes
  }

  /// Returns a data set holding a determinate-length sequence, an
  /// indeterminate-length sequence, a zero-length value, and encapsulated
  /// pixel data.
  ///
  fn data_set() -> Vec<u8> {
    let mut bytes = vec![];

    let uid = element(0x0020, 0x000E, b"UI", b"1.2.3\0");
    bytes.extend(header(0x0008, 0x1115, b"SQ", 8 + uid.len() as u32));
    bytes.extend(control(0xE000, uid.len() as u32));
    bytes.extend(uid);

    bytes.extend(header(0x0008, 0x1140, b"SQ", UNDEFINED));
    bytes.extend(control(0xE000, UNDEFINED));
    bytes.extend(element(0x0010, 0x0020, b"LO", b"ID"));
    bytes.extend(control(0xE00D, 0));
    bytes.extend(control(0xE000, UNDEFINED));
    bytes.extend(control(0xE00D, 0));
    bytes.extend(control(0xE0DD, 0));

    bytes.extend(element(0x0010, 0x0010, b"PN", b"Doe^John"));
    bytes.extend(element(0x0010, 0x0020, b"LO", b""));

    bytes.extend(header(0x7FE0, 0x0010, b"OB", UNDEFINED));
    bytes.extend(control(0xE000, 0));
    bytes.extend(control(0xE000, 4));
    bytes.extend_from_slice(&[1, 2, 3, 4]);
    bytes.extend(control(0xE0DD, 0));

    bytes
  }

  fn p10_file() -> Vec<u8> {
    let mut bytes = file_meta(transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid);
    bytes.extend(data_set());
    bytes
  }

  fn deflated_p10_file(zlib_header: bool) -> (Vec<u8>, Vec<u8>) {
    let file_meta =
      file_meta(transfer_syntax::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.uid);

    let deflated = if zlib_header {
      let mut encoder = ZlibEncoder::new(vec![], Compression::default());
      encoder.write_all(&data_set()).unwrap();
      encoder.finish().unwrap()
    } else {
      let mut encoder = DeflateEncoder::new(vec![], Compression::default());
      encoder.write_all(&data_set()).unwrap();
      encoder.finish().unwrap()
    };

    (file_meta, deflated)
  }

  fn concat_bytes(parts: &[DicomPart]) -> Vec<u8> {
    parts.iter().flat_map(|part| part.bytes().to_vec()).collect()
  }

  /// Parses bytes that are written to the parse context in chunks whose sizes
  /// are given by `next_chunk_size`.
  ///
  fn jittered_parse(
    bytes: &[u8],
    config: Option<ParseConfig>,
    next_chunk_size: &mut impl FnMut() -> usize,
  ) -> Result<Vec<DicomPart>, StreamError> {
    let mut context = ParseContext::new(config);
    let mut offset = 0;
    let mut parts = vec![];

    while !context.is_finished() {
      match context.read_parts() {
        Ok(new_parts) => parts.extend(new_parts),

        Err(StreamError::DataRequired { .. }) => {
          let end = (offset + next_chunk_size()).min(bytes.len());
          let done = end == bytes.len();
          context.write_bytes(bytes[offset..end].to_vec(), done)?;
          offset = end;
        }

        Err(e) => return Err(e),
      }
    }

    Ok(parts)
  }

  /// Runs bytes through the full stack of capability layers, and returns
  /// descriptions of every part seen by the consumer along with its tag path.
  ///
  fn consumer_events(bytes: Vec<u8>) -> (Vec<String>, Vec<DicomPart>) {
    let mut events = vec![];

    let outputs = {
      let mut driver = FlowDriver::new(
        full_stack(DeferToPartFlow::new(
          |part: &DicomPart, context: &FlowContext| {
            events.push(format!(
              "{} @ {}",
              part,
              context.tag_path().map(|p| p.to_string()).unwrap_or_default()
            ));
            Ok(vec![part.clone()])
          },
        )),
        None,
      );

      driver.write_bytes(bytes, true).unwrap()
    };

    (events, outputs)
  }

  #[test]
  fn round_trip_test() {
    let bytes = p10_file();

    let parts = parse_bytes(bytes.clone(), None).unwrap();
    assert_eq!(concat_bytes(&parts), bytes);

    let config = ParseConfig::default().chunk_size(3);
    let parts = parse_bytes(bytes.clone(), Some(config)).unwrap();
    assert_eq!(concat_bytes(&parts), bytes);

    let outputs =
      run_stream(&mut bytes.as_slice(), None, full_stack(IdentityFlow::new()))
        .unwrap();
    assert_eq!(concat_bytes(&outputs), bytes);
  }

  #[test]
  fn chunking_invariance_test() {
    for bytes in [p10_file(), data_set()] {
      let whole = parse_bytes(bytes.clone(), None).unwrap();

      assert_eq!(jittered_parse(&bytes, None, &mut || 1), Ok(whole.clone()));
      assert_eq!(jittered_parse(&bytes, None, &mut || 15), Ok(whole.clone()));

      let mut rng = SmallRng::seed_from_u64(RNG_SEED);
      assert_eq!(
        jittered_parse(&bytes, None, &mut || rng.gen_range(1..256)),
        Ok(whole)
      );
    }
  }

  #[test]
  fn deflated_chunking_invariance_test() {
    let (file_meta, deflated) = deflated_p10_file(false);
    let bytes = [file_meta, deflated].concat();

    let whole = parse_bytes(bytes.clone(), None).unwrap();

    let mut rng = SmallRng::seed_from_u64(RNG_SEED);
    assert_eq!(
      jittered_parse(&bytes, None, &mut || rng.gen_range(1..256)),
      Ok(whole.clone())
    );
    assert_eq!(jittered_parse(&bytes, None, &mut || 1), Ok(whole));
  }

  #[test]
  fn delimitation_completeness_test() {
    let mut counts = [0usize; 4];

    {
      let mut driver = FlowDriver::new(
        full_stack(DeferToPartFlow::new(
          |part: &DicomPart, context: &FlowContext| {
            let in_fragments = context.in_fragments() == Some(true);

            match part {
              DicomPart::Sequence(_) => counts[0] += 1,
              DicomPart::SequenceDelimitation(_) if !in_fragments => {
                counts[1] += 1
              }
              DicomPart::Item(_) if !in_fragments => counts[2] += 1,
              DicomPart::ItemDelimitation(_) => counts[3] += 1,
              _ => (),
            }

            Ok(Vec::<DicomPart>::new())
          },
        )),
        None,
      );

      driver.write_bytes(p10_file(), true).unwrap();
    }

    assert_eq!(counts, [2, 2, 3, 3]);
  }

  #[test]
  fn tag_paths_test() {
    let mut paths: Vec<TagPath> = vec![];

    {
      let flow = tag_path_stack(DeferToPartFlow::new(
        |_: &DicomPart, context: &FlowContext| {
          let path = context.tag_path().cloned().unwrap_or_default();
          if paths.last() != Some(&path) {
            paths.push(path);
          }

          Ok(Vec::<DicomPart>::new())
        },
      ));

      run_stream(&mut p10_file().as_slice(), None, flow).unwrap();
    }

    assert_eq!(
      paths.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
      vec![
        "",
        "(0002,0000)",
        "(0002,0010)",
        "(0008,1115)",
        "(0008,1115)[1]",
        "(0008,1115)[1].(0020,000E)",
        "(0008,1115)[1]:end",
        "(0008,1115):end",
        "(0008,1140)",
        "(0008,1140)[1]",
        "(0008,1140)[1].(0010,0020)",
        "(0008,1140)[1]:end",
        "(0008,1140)[2]",
        "(0008,1140)[2]:end",
        "(0008,1140):end",
        "(0010,0010)",
        "(0010,0020)",
        "(7FE0,0010)",
      ]
    );

    // Paths are emitted in sorted order
    let mut shuffled = paths.clone();
    let mut rng = SmallRng::seed_from_u64(RNG_SEED);
    shuffled.shuffle(&mut rng);
    shuffled.sort_by(|a, b| a.partial_cmp(b).unwrap());

    assert_eq!(shuffled, paths);
  }

  #[test]
  fn tag_tree_selection_test() {
    let tree = TagTree::from_any_item(dictionary::REFERENCED_IMAGE_SEQUENCE.tag)
      .then_tag(dictionary::PATIENT_ID.tag);

    let selector = tree.clone();
    let flow = tag_path_stack(DeferToPartFlow::new(
      move |part: &DicomPart, context: &FlowContext| match part {
        DicomPart::ValueChunk(chunk)
          if context.tag_path().is_some_and(|path| selector.has_path(path)) =>
        {
          Ok(vec![String::from_utf8_lossy(&chunk.bytes).to_string()])
        }

        _ => Ok(vec![]),
      },
    ));

    assert_eq!(
      run_stream(&mut p10_file().as_slice(), None, flow),
      Ok(vec!["ID".to_string()])
    );

    for (path, expected) in [
      ("(0008,1140)[3].(0010,0020)", true),
      ("(0008,1140)[1].(0010,0010)", false),
      ("(0008,1115)[1].(0010,0020)", false),
      ("(0010,0020)", false),
    ] {
      assert_eq!(tree.has_path(&TagPath::parse(path).unwrap()), expected);
    }

    // Sequence and item nodes at the same depth never match
    let sequence = dictionary::REFERENCED_IMAGE_SEQUENCE.tag;
    let item = TagPath::from_item(sequence, 1);
    assert!(!tree.has_path(&item.then_sequence(dictionary::PATIENT_ID.tag)));
    assert!(!tree.has_path(&item.then_item_end(sequence, 1)));
    assert!(!tree.has_path(&TagPath::from_sequence(sequence)));
    assert!(!tree.has_path(&TagPath::from_sequence_end(sequence)));

    let tree =
      TagTree::parse("ReferencedSeriesSequence[*].SeriesInstanceUID").unwrap();
    let path = TagPath::parse("(0008,1115)[1].(0020,000E)").unwrap();
    assert!(tree.has_path(&path));
  }

  #[test]
  fn inflate_test() {
    for zlib_header in [false, true] {
      let (file_meta, deflated) = deflated_p10_file(zlib_header);

      let parts =
        parse_bytes([file_meta.clone(), deflated].concat(), None).unwrap();

      assert_eq!(concat_bytes(&parts), [file_meta, data_set()].concat());
      assert!(parts
        .iter()
        .any(|part| part.tag() == Some(dictionary::PATIENT_NAME.tag)));
    }
  }

  #[test]
  fn deflated_chunks_test() {
    for zlib_header in [false, true] {
      let (file_meta, deflated) = deflated_p10_file(zlib_header);
      let bytes = [file_meta, deflated].concat();

      let config = ParseConfig::default().inflate(false).chunk_size(16);
      let parts = parse_bytes(bytes.clone(), Some(config)).unwrap();

      assert_eq!(concat_bytes(&parts), bytes);

      let chunks = parts
        .iter()
        .filter_map(|part| match part {
          DicomPart::DeflatedChunk(chunk) => Some(chunk),
          _ => None,
        })
        .collect::<Vec<_>>();

      assert!(chunks.len() > 1);
      assert!(chunks.iter().all(|chunk| chunk.nowrap == !zlib_header));
    }
  }

  #[test]
  fn minimal_file_test() {
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    bytes.extend(element(0x0010, 0x0010, b"PN", b"John^Doe"));

    let parts = parse_bytes(bytes, None).unwrap();

    assert_eq!(
      parts.iter().map(|part| part.to_string()).collect::<Vec<_>>(),
      vec![
        "Preamble",
        "Header: (0010,0010) PatientName, vr: PN, length: 8 bytes",
        "ValueChunk: [4A 6F 68 6E 5E 44 6F 65], last: true",
      ]
    );
  }

  #[test]
  fn file_meta_events_test() {
    let mut bytes = file_meta(transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid);
    bytes.extend(element(0x0010, 0x0010, b"PN", b"Doe^Jane"));

    let (events, outputs) = consumer_events(bytes.clone());

    assert_eq!(
      events,
      vec![
        "DicomStart (marker) @ ",
        "Preamble @ ",
        "Header: (0002,0000) FileMetaInformationGroupLength, vr: UL, \
         length: 4 bytes, file meta @ (0002,0000)",
        "ValueChunk: [1C 00 00 00], last: true @ (0002,0000)",
        "Header: (0002,0010) TransferSyntaxUID, vr: UI, length: 20 bytes, \
         file meta @ (0002,0010)",
        "ValueChunk: [31 2E 32 2E 38 34 30 2E 31 30 30 30 38 2E 31 2E ... (20 \
         bytes)], last: true @ (0002,0010)",
        "Header: (0010,0010) PatientName, vr: PN, length: 8 bytes @ \
         (0010,0010)",
        "ValueChunk: [44 6F 65 5E 4A 61 6E 65], last: true @ (0010,0010)",
        "DicomEnd (marker) @ (0010,0010)",
      ]
    );

    assert_eq!(concat_bytes(&outputs), bytes);
  }

  #[test]
  fn zero_length_value_test() {
    let bytes = element(0x0010, 0x0020, b"LO", b"");

    let (events, outputs) = consumer_events(bytes);

    assert_eq!(
      events[1..3],
      [
        "Header: (0010,0020) PatientID, vr: LO, length: 0 bytes @ (0010,0020)",
        "ValueChunk: [], last: true (marker) @ (0010,0020)",
      ]
    );
    assert_eq!(outputs.len(), 1);
  }

  #[test]
  fn determinate_sequence_test() {
    let uid = element(0x0020, 0x000E, b"UI", b"1.2.3.4\0");

    let mut bytes = header(0x0008, 0x1115, b"SQ", 24);
    bytes.extend(control(0xE000, 16));
    bytes.extend(uid);

    let (events, outputs) = consumer_events(bytes);

    assert_eq!(
      events[5..7],
      [
        "ItemDelimitation: index: 1 (marker) @ (0008,1115)[1]:end",
        "SequenceDelimitation (marker) @ (0008,1115):end",
      ]
    );
    assert_eq!(outputs.len(), 4);
  }

  #[test]
  fn corrupt_stream_test() {
    let bytes = vec![0xFF; 16];

    let error = run_stream(
      &mut bytes.as_slice(),
      None,
      full_stack(IdentityFlow::new()),
    )
    .unwrap_err();

    assert!(matches!(error, StreamError::NotDicom { .. }));
    assert_eq!(
      error.to_lines("reading corrupt data")[0],
      "DICOM stream error reading corrupt data"
    );
  }

  #[test]
  fn truncated_stream_test() {
    let bytes = p10_file();

    let mut driver = FlowDriver::new(full_stack(IdentityFlow::new()), None);

    assert!(matches!(
      driver.write_bytes(bytes[..bytes.len() - 3].to_vec(), true),
      Err(StreamError::DataEndedUnexpectedly { .. })
    ));
  }
}
