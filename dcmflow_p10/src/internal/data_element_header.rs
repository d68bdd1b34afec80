use byteorder::{BigEndian, ByteOrder, LittleEndian};

use dcmflow_core::{
  dictionary, DataElementTag, ValueLengthSize, ValueRepresentation,
};

use super::byte_cursor::{ByteCursor, CursorError};

/// The header of a single data element as found in the input, before it has
/// been classified into a part.
///
/// The VR is `None` for the item and delimitation control elements in group
/// `0xFFFE`, which never have a VR, and for explicit VR headers whose VR bytes
/// aren't a recognized VR.
///
#[derive(Debug, PartialEq)]
pub struct DataElementHeader {
  pub tag: DataElementTag,
  pub vr: Option<ValueRepresentation>,
  pub length: u32,
  pub header_length: usize,
}

impl std::fmt::Display for DataElementHeader {
  /// Formats a header as "(GROUP,ELEMENT) VR NAME", e.g.
  /// `"(0008,0020) DA StudyDate"`.
  ///
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let tag_name = dictionary::tag_name(self.tag);

    match self.vr {
      Some(vr) => write!(f, "{} {} {}", self.tag, vr, tag_name),
      None => write!(f, "{} {}", self.tag, tag_name),
    }
  }
}

pub fn read_u16(bytes: &[u8], big_endian: bool) -> u16 {
  if big_endian {
    BigEndian::read_u16(bytes)
  } else {
    LittleEndian::read_u16(bytes)
  }
}

pub fn read_u32(bytes: &[u8], big_endian: bool) -> u32 {
  if big_endian {
    BigEndian::read_u32(bytes)
  } else {
    LittleEndian::read_u32(bytes)
  }
}

pub fn read_tag(bytes: &[u8], big_endian: bool) -> DataElementTag {
  DataElementTag::new(
    read_u16(&bytes[0..2], big_endian),
    read_u16(&bytes[2..4], big_endian),
  )
}

/// Peeks the next data element header without consuming it.
///
/// Control elements in group `0xFFFE` always have an 8-byte header with a
/// 32-bit length. Otherwise, implicit VR headers take their VR from the
/// dictionary, and explicit VR headers are 8 or 12 bytes depending on their
/// VR. An explicit VR header with unrecognized VR bytes is read as an 8-byte
/// header with a 32-bit length following the tag.
///
pub fn peek_header(
  cursor: &mut ByteCursor,
  big_endian: bool,
  explicit_vr: bool,
) -> Result<DataElementHeader, CursorError> {
  let mut data = [0u8; 8];
  data.copy_from_slice(cursor.peek(8)?);

  let tag = read_tag(&data, big_endian);

  if tag.group == 0xFFFE || !explicit_vr {
    let vr = if tag.group == 0xFFFE {
      None
    } else {
      Some(dictionary::vr_of(tag))
    };

    return Ok(DataElementHeader {
      tag,
      vr,
      length: read_u32(&data[4..8], big_endian),
      header_length: 8,
    });
  }

  let vr = match ValueRepresentation::from_bytes(&data[4..6]) {
    Ok(vr) => vr,
    Err(()) => {
      return Ok(DataElementHeader {
        tag,
        vr: None,
        length: read_u32(&data[4..8], big_endian),
        header_length: 8,
      })
    }
  };

  let length = match vr.value_length_size() {
    ValueLengthSize::U16 => read_u16(&data[6..8], big_endian) as u32,
    ValueLengthSize::U32 => read_u32(&cursor.peek(12)?[8..12], big_endian),
  };

  Ok(DataElementHeader {
    tag,
    vr: Some(vr),
    length,
    header_length: vr.explicit_header_length(),
  })
}
