//! A DICOM data element tag, defined as 16-bit `group` and `element` values.

/// A data element tag that is defined by `group` and `element` values, each of
/// which is a 16-bit unsigned integer. Tags order numerically, group first.
///
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DataElementTag {
  pub group: u16,
  pub element: u16,
}

impl std::fmt::Display for DataElementTag {
  /// Formats a data element tag as `"($GROUP,$ELEMENT)"`, e.g.`"(0008,0020)"`.
  ///
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "({:04X},{:04X})", self.group, self.element)
  }
}

impl DataElementTag {
  /// Creates a new data element tag with the given group and element values.
  ///
  pub const fn new(group: u16, element: u16) -> Self {
    Self { group, element }
  }

  /// Creates a data element tag from a single 32-bit integer where the group
  /// is in the high 16 bits and the element is in the low 16 bits.
  ///
  pub const fn from_int(value: u32) -> Self {
    Self {
      group: (value >> 16) as u16,
      element: (value & 0xFFFF) as u16,
    }
  }

  /// Converts a tag to a single 32-bit integer where the group is in the high
  /// 16 bits and the element is in the low 16 bits.
  ///
  pub fn to_int(&self) -> u32 {
    ((self.group as u32) << 16) | self.element as u32
  }

  /// Returns whether the tag is private, which is determined by the group
  /// number being odd.
  ///
  pub fn is_private(&self) -> bool {
    self.group & 1 == 1
  }

  /// Returns whether the tag is for a private creator, which is determined by
  /// the group number being odd and the element being between 0x10 and 0xFF.
  /// Ref: PS3.5 7.8.1.
  ///
  pub fn is_private_creator(&self) -> bool {
    self.is_private() && (0x10..=0xFF).contains(&self.element)
  }

  /// Returns whether the tag is a group length tag, i.e. its element is zero.
  ///
  pub fn is_group_length(&self) -> bool {
    self.element == 0x0000
  }

  /// Returns whether the tag belongs to the File Meta Information group.
  ///
  pub fn is_file_meta_information(&self) -> bool {
    self.group == 0x0002
  }

  /// Returns whether the tag is one of the item or delimitation tags in group
  /// 0xFFFE. These are always encoded with an implicit VR header.
  ///
  pub fn is_item_or_delimitation(&self) -> bool {
    self.group == 0xFFFE
  }

  /// Formats a data element tag as `"$GROUP$ELEMENT"`, e.g.`"0008002D"`.
  ///
  pub fn to_hex_string(&self) -> String {
    format!("{:04X}{:04X}", self.group, self.element)
  }

  /// Creates a data element tag from a hex string formatted either as
  /// `"$GROUP$ELEMENT"`, e.g.`"0008002D"`, or as `"($GROUP,$ELEMENT)"`.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_hex_string(tag: &str) -> Result<Self, ()> {
    let digits: String = match tag.strip_prefix('(') {
      Some(rest) => {
        let inner = rest.strip_suffix(')').ok_or(())?;
        let (group, element) = inner.split_once(',').ok_or(())?;
        if group.len() != 4 || element.len() != 4 {
          return Err(());
        }
        format!("{}{}", group, element)
      }
      None => tag.to_string(),
    };

    if digits.len() != 8 || !digits.is_ascii() {
      return Err(());
    }

    let group = u16::from_str_radix(&digits[0..4], 16).map_err(|_| ())?;
    let element = u16::from_str_radix(&digits[4..8], 16).map_err(|_| ())?;

    Ok(Self { group, element })
  }
}
