//! DICOM value representations (VRs).
//!
//! See [section 6.2](https://dicom.nema.org/medical/dicom/current/output/chtml/part05/sect_6.2.html)
//! of the DICOM specification for VR definitions.

/// All DICOM value representations (VRs).
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueRepresentation {
  AgeString,
  ApplicationEntity,
  AttributeTag,
  CodeString,
  Date,
  DateTime,
  DecimalString,
  FloatingPointDouble,
  FloatingPointSingle,
  IntegerString,
  LongString,
  LongText,
  OtherByteString,
  OtherDoubleString,
  OtherFloatString,
  OtherLongString,
  OtherVeryLongString,
  OtherWordString,
  PersonName,
  Sequence,
  ShortString,
  ShortText,
  SignedLong,
  SignedShort,
  SignedVeryLong,
  Time,
  UniqueIdentifier,
  UniversalResourceIdentifier,
  Unknown,
  UnlimitedCharacters,
  UnlimitedText,
  UnsignedLong,
  UnsignedShort,
  UnsignedVeryLong,
}

/// The two sizes of value length field that follow an explicit VR.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueLengthSize {
  /// Two-byte length directly after the VR, giving an 8-byte header.
  U16,

  /// Two reserved bytes then a four-byte length, giving a 12-byte header.
  U32,
}

impl std::fmt::Display for ValueRepresentation {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let bytes = self.to_bytes();
    write!(f, "{}{}", bytes[0] as char, bytes[1] as char)
  }
}

impl ValueRepresentation {
  /// Converts a two-character code, e.g. "DA", into a value representation.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, ()> {
    let vr = match bytes {
      b"AE" => ValueRepresentation::ApplicationEntity,
      b"AS" => ValueRepresentation::AgeString,
      b"AT" => ValueRepresentation::AttributeTag,
      b"CS" => ValueRepresentation::CodeString,
      b"DA" => ValueRepresentation::Date,
      b"DS" => ValueRepresentation::DecimalString,
      b"DT" => ValueRepresentation::DateTime,
      b"FD" => ValueRepresentation::FloatingPointDouble,
      b"FL" => ValueRepresentation::FloatingPointSingle,
      b"IS" => ValueRepresentation::IntegerString,
      b"LO" => ValueRepresentation::LongString,
      b"LT" => ValueRepresentation::LongText,
      b"OB" => ValueRepresentation::OtherByteString,
      b"OD" => ValueRepresentation::OtherDoubleString,
      b"OF" => ValueRepresentation::OtherFloatString,
      b"OL" => ValueRepresentation::OtherLongString,
      b"OV" => ValueRepresentation::OtherVeryLongString,
      b"OW" => ValueRepresentation::OtherWordString,
      b"PN" => ValueRepresentation::PersonName,
      b"SH" => ValueRepresentation::ShortString,
      b"SL" => ValueRepresentation::SignedLong,
      b"SQ" => ValueRepresentation::Sequence,
      b"SS" => ValueRepresentation::SignedShort,
      b"ST" => ValueRepresentation::ShortText,
      b"SV" => ValueRepresentation::SignedVeryLong,
      b"TM" => ValueRepresentation::Time,
      b"UC" => ValueRepresentation::UnlimitedCharacters,
      b"UI" => ValueRepresentation::UniqueIdentifier,
      b"UL" => ValueRepresentation::UnsignedLong,
      b"UN" => ValueRepresentation::Unknown,
      b"UR" => ValueRepresentation::UniversalResourceIdentifier,
      b"US" => ValueRepresentation::UnsignedShort,
      b"UT" => ValueRepresentation::UnlimitedText,
      b"UV" => ValueRepresentation::UnsignedVeryLong,

      _ => return Err(()),
    };

    Ok(vr)
  }

  /// Converts a value representation to its two-byte character code.
  ///
  pub fn to_bytes(&self) -> [u8; 2] {
    *match self {
      ValueRepresentation::AgeString => b"AS",
      ValueRepresentation::ApplicationEntity => b"AE",
      ValueRepresentation::AttributeTag => b"AT",
      ValueRepresentation::CodeString => b"CS",
      ValueRepresentation::Date => b"DA",
      ValueRepresentation::DateTime => b"DT",
      ValueRepresentation::DecimalString => b"DS",
      ValueRepresentation::FloatingPointDouble => b"FD",
      ValueRepresentation::FloatingPointSingle => b"FL",
      ValueRepresentation::IntegerString => b"IS",
      ValueRepresentation::LongString => b"LO",
      ValueRepresentation::LongText => b"LT",
      ValueRepresentation::OtherByteString => b"OB",
      ValueRepresentation::OtherDoubleString => b"OD",
      ValueRepresentation::OtherFloatString => b"OF",
      ValueRepresentation::OtherLongString => b"OL",
      ValueRepresentation::OtherVeryLongString => b"OV",
      ValueRepresentation::OtherWordString => b"OW",
      ValueRepresentation::PersonName => b"PN",
      ValueRepresentation::Sequence => b"SQ",
      ValueRepresentation::ShortString => b"SH",
      ValueRepresentation::ShortText => b"ST",
      ValueRepresentation::SignedLong => b"SL",
      ValueRepresentation::SignedShort => b"SS",
      ValueRepresentation::SignedVeryLong => b"SV",
      ValueRepresentation::Time => b"TM",
      ValueRepresentation::UniqueIdentifier => b"UI",
      ValueRepresentation::UniversalResourceIdentifier => b"UR",
      ValueRepresentation::Unknown => b"UN",
      ValueRepresentation::UnlimitedCharacters => b"UC",
      ValueRepresentation::UnlimitedText => b"UT",
      ValueRepresentation::UnsignedLong => b"UL",
      ValueRepresentation::UnsignedShort => b"US",
      ValueRepresentation::UnsignedVeryLong => b"UV",
    }
  }

  /// Returns the human-readable name of a value representation, e.g.
  /// `CodeString`, `AttributeTag`.
  ///
  pub fn name(&self) -> &'static str {
    match self {
      ValueRepresentation::AgeString => "AgeString",
      ValueRepresentation::ApplicationEntity => "ApplicationEntity",
      ValueRepresentation::AttributeTag => "AttributeTag",
      ValueRepresentation::CodeString => "CodeString",
      ValueRepresentation::Date => "Date",
      ValueRepresentation::DateTime => "DateTime",
      ValueRepresentation::DecimalString => "DecimalString",
      ValueRepresentation::FloatingPointDouble => "FloatingPointDouble",
      ValueRepresentation::FloatingPointSingle => "FloatingPointSingle",
      ValueRepresentation::IntegerString => "IntegerString",
      ValueRepresentation::LongString => "LongString",
      ValueRepresentation::LongText => "LongText",
      ValueRepresentation::OtherByteString => "OtherByteString",
      ValueRepresentation::OtherDoubleString => "OtherDoubleString",
      ValueRepresentation::OtherFloatString => "OtherFloatString",
      ValueRepresentation::OtherLongString => "OtherLongString",
      ValueRepresentation::OtherVeryLongString => "OtherVeryLongString",
      ValueRepresentation::OtherWordString => "OtherWordString",
      ValueRepresentation::PersonName => "PersonName",
      ValueRepresentation::Sequence => "Sequence",
      ValueRepresentation::ShortString => "ShortString",
      ValueRepresentation::ShortText => "ShortText",
      ValueRepresentation::SignedLong => "SignedLong",
      ValueRepresentation::SignedShort => "SignedShort",
      ValueRepresentation::SignedVeryLong => "SignedVeryLong",
      ValueRepresentation::Time => "Time",
      ValueRepresentation::UniqueIdentifier => "UniqueIdentifier",
      ValueRepresentation::UniversalResourceIdentifier => {
        "UniversalResourceIdentifier"
      }
      ValueRepresentation::Unknown => "Unknown",
      ValueRepresentation::UnlimitedCharacters => "UnlimitedCharacters",
      ValueRepresentation::UnlimitedText => "UnlimitedText",
      ValueRepresentation::UnsignedLong => "UnsignedLong",
      ValueRepresentation::UnsignedShort => "UnsignedShort",
      ValueRepresentation::UnsignedVeryLong => "UnsignedVeryLong",
    }
  }

  /// Returns the size of the value length field that follows this VR in an
  /// explicit VR data element header.
  ///
  pub fn value_length_size(self) -> ValueLengthSize {
    match self {
      ValueRepresentation::AgeString
      | ValueRepresentation::ApplicationEntity
      | ValueRepresentation::AttributeTag
      | ValueRepresentation::CodeString
      | ValueRepresentation::Date
      | ValueRepresentation::DateTime
      | ValueRepresentation::DecimalString
      | ValueRepresentation::FloatingPointDouble
      | ValueRepresentation::FloatingPointSingle
      | ValueRepresentation::IntegerString
      | ValueRepresentation::LongString
      | ValueRepresentation::LongText
      | ValueRepresentation::PersonName
      | ValueRepresentation::ShortString
      | ValueRepresentation::ShortText
      | ValueRepresentation::SignedLong
      | ValueRepresentation::SignedShort
      | ValueRepresentation::Time
      | ValueRepresentation::UniqueIdentifier
      | ValueRepresentation::UnsignedLong
      | ValueRepresentation::UnsignedShort => ValueLengthSize::U16,

      _ => ValueLengthSize::U32,
    }
  }

  /// Returns the total size in bytes of an explicit VR data element header
  /// using this VR, which is either 8 or 12.
  ///
  pub fn explicit_header_length(self) -> usize {
    match self.value_length_size() {
      ValueLengthSize::U16 => 8,
      ValueLengthSize::U32 => 12,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      ValueRepresentation::from_bytes(b"PN"),
      Ok(ValueRepresentation::PersonName)
    );
    assert_eq!(
      ValueRepresentation::from_bytes(b"SQ"),
      Ok(ValueRepresentation::Sequence)
    );

    assert_eq!(ValueRepresentation::from_bytes(b"XY"), Err(()));
    assert_eq!(ValueRepresentation::from_bytes(b"  "), Err(()));
    assert_eq!(ValueRepresentation::from_bytes(b"P"), Err(()));
  }

  #[test]
  fn to_bytes_reverses_from_bytes_test() {
    for code in [b"AE", b"OB", b"OW", b"UN", b"UT", b"UV", b"FD", b"AT"] {
      let vr = ValueRepresentation::from_bytes(code).unwrap();
      assert_eq!(&vr.to_bytes(), code);
    }
  }

  #[test]
  fn to_string_test() {
    assert_eq!(ValueRepresentation::UniqueIdentifier.to_string(), "UI");
    assert_eq!(ValueRepresentation::Sequence.name(), "Sequence");
  }

  #[test]
  fn explicit_header_length_test() {
    assert_eq!(ValueRepresentation::PersonName.explicit_header_length(), 8);
    assert_eq!(ValueRepresentation::UnsignedLong.explicit_header_length(), 8);
    assert_eq!(ValueRepresentation::Sequence.explicit_header_length(), 12);
    assert_eq!(
      ValueRepresentation::OtherByteString.explicit_header_length(),
      12
    );
    assert_eq!(ValueRepresentation::Unknown.explicit_header_length(), 12);
    assert_eq!(
      ValueRepresentation::UnlimitedText.value_length_size(),
      ValueLengthSize::U32
    );
  }
}
