//! Defines the parts that a DICOM byte stream is parsed into.
//!
//! Every part read from the input carries the exact bytes it was parsed from,
//! so concatenating the bytes of all parts reproduces the input. Flows can
//! also emit zero-byte marker parts, which never come from the input and are
//! removed again by the flow that introduced them.

use std::rc::Rc;

use dcmflow_core::{dictionary, utils, DataElementTag, ValueRepresentation};

/// The value length that marks a sequence, item or fragments element as having
/// an indeterminate length that is ended by a delimitation element.
///
pub const INDETERMINATE_LENGTH: u32 = 0xFFFFFFFF;

/// A part is the smallest piece of structured DICOM data emitted by a
/// [`crate::ParseContext`].
///
#[derive(Clone, Debug, PartialEq)]
pub enum DicomPart {
  /// The 128-byte File Preamble followed by the "DICM" prefix.
  Preamble(PreamblePart),

  /// The header of a data element that has a value, i.e. one that isn't a
  /// sequence or encapsulated pixel data.
  Header(HeaderPart),

  /// Some or all of the value bytes of the preceding header or fragment item.
  ValueChunk(ValueChunkPart),

  /// The start of a sequence.
  Sequence(SequencePart),

  /// The start of an item in a sequence, or of a fragment in encapsulated
  /// pixel data.
  Item(ItemPart),

  /// The end of an item in a sequence.
  ItemDelimitation(ItemDelimitationPart),

  /// The end of a sequence, or of encapsulated pixel data.
  SequenceDelimitation(SequenceDelimitationPart),

  /// The start of encapsulated pixel data, which has an indeterminate length
  /// and holds a run of fragment items.
  Fragments(FragmentsPart),

  /// Deflated data set bytes that have not been inflated.
  DeflatedChunk(DeflatedChunkPart),

  /// The header of an element that couldn't be interpreted as any other
  /// part. Its value follows as value chunks.
  Unknown(UnknownPart),

  /// A marker for the start or end of the part stream.
  Meta(MetaPart),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreamblePart {
  pub bytes: Rc<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderPart {
  pub tag: DataElementTag,
  pub vr: ValueRepresentation,
  pub length: u32,
  pub is_fmi: bool,
  pub big_endian: bool,
  pub explicit_vr: bool,
  pub bytes: Rc<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValueChunkPart {
  pub big_endian: bool,
  pub bytes: Rc<Vec<u8>>,
  pub last: bool,
  pub(crate) marker: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequencePart {
  pub tag: DataElementTag,
  pub length: u32,
  pub big_endian: bool,
  pub explicit_vr: bool,
  pub bytes: Rc<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemPart {
  /// The 1-based index of this item in its sequence, or of this fragment in
  /// its encapsulated pixel data.
  pub index: u32,
  pub length: u32,
  pub big_endian: bool,
  pub bytes: Rc<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemDelimitationPart {
  /// The 1-based index of the item this delimitation ends.
  pub index: u32,
  pub big_endian: bool,
  pub bytes: Rc<Vec<u8>>,
  pub(crate) marker: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequenceDelimitationPart {
  pub big_endian: bool,
  pub bytes: Rc<Vec<u8>>,
  pub(crate) marker: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FragmentsPart {
  pub tag: DataElementTag,
  pub vr: ValueRepresentation,
  pub length: u32,
  pub big_endian: bool,
  pub explicit_vr: bool,
  pub bytes: Rc<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeflatedChunkPart {
  pub big_endian: bool,
  pub bytes: Rc<Vec<u8>>,

  /// Whether the deflate data is raw, i.e. it has no zlib header.
  pub nowrap: bool,
}

/// The header of an element that couldn't be interpreted, e.g. one with
/// invalid VR bytes. Its value follows as value chunks.
///
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownPart {
  pub tag: DataElementTag,
  pub length: u32,
  pub big_endian: bool,
  pub bytes: Rc<Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetaPart {
  DicomStart,
  DicomEnd,
}

impl SequencePart {
  pub fn has_indeterminate_length(&self) -> bool {
    self.length == INDETERMINATE_LENGTH
  }
}

impl ItemPart {
  pub fn has_indeterminate_length(&self) -> bool {
    self.length == INDETERMINATE_LENGTH
  }
}

impl DicomPart {
  /// Returns a zero-byte final value chunk, used to give zero-length values a
  /// value event.
  ///
  pub fn value_marker(big_endian: bool) -> Self {
    DicomPart::ValueChunk(ValueChunkPart {
      big_endian,
      bytes: Rc::new(vec![]),
      last: true,
      marker: true,
    })
  }

  /// Returns a zero-byte item delimitation for an item that has a determinate
  /// length.
  ///
  pub fn item_delimitation_marker(index: u32, big_endian: bool) -> Self {
    DicomPart::ItemDelimitation(ItemDelimitationPart {
      index,
      big_endian,
      bytes: Rc::new(vec![]),
      marker: true,
    })
  }

  /// Returns a zero-byte sequence delimitation for a sequence that has a
  /// determinate length.
  ///
  pub fn sequence_delimitation_marker(big_endian: bool) -> Self {
    DicomPart::SequenceDelimitation(SequenceDelimitationPart {
      big_endian,
      bytes: Rc::new(vec![]),
      marker: true,
    })
  }

  /// Returns whether this part was synthesized by a flow rather than read from
  /// the input.
  ///
  pub fn is_marker(&self) -> bool {
    match self {
      DicomPart::ValueChunk(part) => part.marker,
      DicomPart::ItemDelimitation(part) => part.marker,
      DicomPart::SequenceDelimitation(part) => part.marker,
      DicomPart::Meta(_) => true,
      _ => false,
    }
  }

  /// Returns the input bytes this part was parsed from. Markers have no bytes.
  ///
  pub fn bytes(&self) -> &[u8] {
    match self {
      DicomPart::Preamble(PreamblePart { bytes })
      | DicomPart::Header(HeaderPart { bytes, .. })
      | DicomPart::ValueChunk(ValueChunkPart { bytes, .. })
      | DicomPart::Sequence(SequencePart { bytes, .. })
      | DicomPart::Item(ItemPart { bytes, .. })
      | DicomPart::ItemDelimitation(ItemDelimitationPart { bytes, .. })
      | DicomPart::SequenceDelimitation(SequenceDelimitationPart {
        bytes, ..
      })
      | DicomPart::Fragments(FragmentsPart { bytes, .. })
      | DicomPart::DeflatedChunk(DeflatedChunkPart { bytes, .. })
      | DicomPart::Unknown(UnknownPart { bytes, .. }) => bytes.as_slice(),

      DicomPart::Meta(_) => &[],
    }
  }

  /// Returns whether this part was read with big endian byte order. The
  /// preamble and meta parts have no byte order and are reported as little
  /// endian.
  ///
  pub fn big_endian(&self) -> bool {
    match self {
      DicomPart::Header(HeaderPart { big_endian, .. })
      | DicomPart::ValueChunk(ValueChunkPart { big_endian, .. })
      | DicomPart::Sequence(SequencePart { big_endian, .. })
      | DicomPart::Item(ItemPart { big_endian, .. })
      | DicomPart::ItemDelimitation(ItemDelimitationPart {
        big_endian, ..
      })
      | DicomPart::SequenceDelimitation(SequenceDelimitationPart {
        big_endian,
        ..
      })
      | DicomPart::Fragments(FragmentsPart { big_endian, .. })
      | DicomPart::DeflatedChunk(DeflatedChunkPart { big_endian, .. })
      | DicomPart::Unknown(UnknownPart { big_endian, .. }) => *big_endian,

      DicomPart::Preamble(_) | DicomPart::Meta(_) => false,
    }
  }

  /// Returns the tag of headers, sequences and fragments.
  ///
  pub fn tag(&self) -> Option<DataElementTag> {
    match self {
      DicomPart::Header(HeaderPart { tag, .. })
      | DicomPart::Sequence(SequencePart { tag, .. })
      | DicomPart::Fragments(FragmentsPart { tag, .. })
      | DicomPart::Unknown(UnknownPart { tag, .. }) => Some(*tag),

      _ => None,
    }
  }
}

impl std::fmt::Display for DicomPart {
  /// Converts a part to a human-readable string.
  ///
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let marker = if self.is_marker() { " (marker)" } else { "" };

    let s = match self {
      DicomPart::Preamble(_) => "Preamble".to_string(),

      DicomPart::Header(part) => format!(
        "Header: {}, vr: {}, length: {} bytes{}",
        dictionary::tag_with_name(part.tag),
        part.vr,
        part.length,
        if part.is_fmi { ", file meta" } else { "" }
      ),

      DicomPart::ValueChunk(part) => format!(
        "ValueChunk: {}, last: {}",
        utils::hex_preview(&part.bytes, 16),
        part.last
      ),

      DicomPart::Sequence(part) => format!(
        "Sequence: {}, length: {}",
        dictionary::tag_with_name(part.tag),
        length_to_string(part.length)
      ),

      DicomPart::Item(part) => format!(
        "Item: index: {}, length: {}",
        part.index,
        length_to_string(part.length)
      ),

      DicomPart::ItemDelimitation(part) => {
        format!("ItemDelimitation: index: {}", part.index)
      }

      DicomPart::SequenceDelimitation(_) => "SequenceDelimitation".to_string(),

      DicomPart::Fragments(part) => format!(
        "Fragments: {}, vr: {}",
        dictionary::tag_with_name(part.tag),
        part.vr
      ),

      DicomPart::DeflatedChunk(part) => format!(
        "DeflatedChunk: {} bytes, nowrap: {}",
        part.bytes.len(),
        part.nowrap
      ),

      DicomPart::Unknown(part) => format!(
        "Unknown: {}, header: {}, length: {} bytes",
        part.tag,
        utils::hex_preview(&part.bytes, 12),
        part.length
      ),

      DicomPart::Meta(MetaPart::DicomStart) => "DicomStart".to_string(),
      DicomPart::Meta(MetaPart::DicomEnd) => "DicomEnd".to_string(),
    };

    write!(f, "{}{}", s, marker)
  }
}

fn length_to_string(length: u32) -> String {
  if length == INDETERMINATE_LENGTH {
    "indeterminate".to_string()
  } else {
    format!("{} bytes", length)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn markers_test() {
    let value = DicomPart::value_marker(false);
    assert!(value.is_marker());
    assert!(value.bytes().is_empty());

    assert!(DicomPart::item_delimitation_marker(2, true).is_marker());
    assert!(DicomPart::item_delimitation_marker(2, true).big_endian());
    assert!(DicomPart::sequence_delimitation_marker(false).is_marker());
    assert!(DicomPart::Meta(MetaPart::DicomEnd).is_marker());

    let read = DicomPart::SequenceDelimitation(SequenceDelimitationPart {
      big_endian: false,
      bytes: Rc::new(vec![0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0]),
      marker: false,
    });
    assert!(!read.is_marker());
    assert_eq!(read.bytes().len(), 8);
  }

  #[test]
  fn to_string_test() {
    let header = DicomPart::Header(HeaderPart {
      tag: dictionary::PATIENT_AGE.tag,
      vr: ValueRepresentation::AgeString,
      length: 4,
      is_fmi: false,
      big_endian: false,
      explicit_vr: true,
      bytes: Rc::new(vec![]),
    });

    assert_eq!(
      header.to_string(),
      "Header: (0010,1010) PatientAge, vr: AS, length: 4 bytes"
    );

    assert_eq!(
      DicomPart::Item(ItemPart {
        index: 3,
        length: INDETERMINATE_LENGTH,
        big_endian: false,
        bytes: Rc::new(vec![]),
      })
      .to_string(),
      "Item: index: 3, length: indeterminate"
    );

    assert_eq!(
      DicomPart::value_marker(false).to_string(),
      "ValueChunk: [], last: true (marker)"
    );
  }
}
