//! Defines the DICOM transfer syntaxes recognized when parsing.

/// The value representation (VR) serialization mode of a transfer syntax. This
/// is either implicit or explicit.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VrSerialization {
  VrImplicit,
  VrExplicit,
}

/// The endianness of a transfer syntax, either little endian or big endian.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endianness {
  LittleEndian,
  BigEndian,
}

/// Describes a single DICOM transfer syntax, with its name, UID, how it
/// serializes value representations (implicit vs explicit), and whether it is
/// deflated.
///
#[derive(Debug, PartialEq)]
pub struct TransferSyntax {
  pub name: &'static str,
  pub uid: &'static str,
  pub vr_serialization: VrSerialization,
  pub endianness: Endianness,
  pub is_deflated: bool,
}

/// The 'Implicit VR Little Endian' transfer syntax.
///
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Implicit VR Little Endian",
  uid: "1.2.840.10008.1.2",
  vr_serialization: VrSerialization::VrImplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
};

/// The 'Explicit VR Little Endian' transfer syntax.
///
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Explicit VR Little Endian",
  uid: "1.2.840.10008.1.2.1",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: false,
};

/// The 'Deflated Explicit VR Little Endian' transfer syntax.
///
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Deflated Explicit VR Little Endian",
  uid: "1.2.840.10008.1.2.1.99",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: true,
};

/// The 'Explicit VR Big Endian' transfer syntax. This was retired from the
/// DICOM standard but is still encountered in older data.
///
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax {
  name: "Explicit VR Big Endian",
  uid: "1.2.840.10008.1.2.2",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::BigEndian,
  is_deflated: false,
};

/// The 'JPIP Referenced Deflate' transfer syntax.
///
pub const JPIP_REFERENCED_DEFLATE: TransferSyntax = TransferSyntax {
  name: "JPIP Referenced Deflate",
  uid: "1.2.840.10008.1.2.4.95",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_deflated: true,
};

/// A list of all transfer syntaxes recognized by UID. Any other UID, such as
/// one for encapsulated pixel data, is read as explicit VR little endian.
///
pub const ALL: [&TransferSyntax; 5] = [
  &IMPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_LITTLE_ENDIAN,
  &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_BIG_ENDIAN,
  &JPIP_REFERENCED_DEFLATE,
];

impl TransferSyntax {
  /// Converts a UID to a transfer syntax. Trailing NUL and space padding on
  /// the UID is ignored.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_uid(uid: &str) -> Result<&'static Self, ()> {
    let uid = uid.trim_end_matches(['\0', ' ']);

    ALL.iter().find(|ts| ts.uid == uid).copied().ok_or(())
  }

  /// Returns whether this transfer syntax stores data with explicit VRs.
  ///
  pub fn is_explicit_vr(&self) -> bool {
    self.vr_serialization == VrSerialization::VrExplicit
  }

  /// Returns whether this transfer syntax stores data in big endian.
  ///
  pub fn is_big_endian(&self) -> bool {
    self.endianness == Endianness::BigEndian
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_uid_test() {
    for ts in ALL {
      assert_eq!(TransferSyntax::from_uid(ts.uid), Ok(ts));
    }

    assert_eq!(
      TransferSyntax::from_uid("1.2.840.10008.1.2.1\0"),
      Ok(&EXPLICIT_VR_LITTLE_ENDIAN)
    );

    assert_eq!(TransferSyntax::from_uid("1.2.3.4"), Err(()));

    // JPEG Baseline is read with the explicit VR little endian fallback
    assert_eq!(TransferSyntax::from_uid("1.2.840.10008.1.2.4.50"), Err(()));
  }

  #[test]
  fn encoding_flags_test() {
    assert!(!IMPLICIT_VR_LITTLE_ENDIAN.is_explicit_vr());
    assert!(EXPLICIT_VR_BIG_ENDIAN.is_big_endian());
    assert!(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.is_deflated);
    assert!(!DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.is_big_endian());
  }
}
