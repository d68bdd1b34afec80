use crate::dicom_part::INDETERMINATE_LENGTH;

/// A value length as stored in a data element header, which is either a
/// defined number of bytes or indeterminate, encoded as `0xFFFFFFFF`.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueLength {
  Defined { length: u32 },
  Indeterminate,
}

impl ValueLength {
  pub fn new(length: u32) -> Self {
    match length {
      INDETERMINATE_LENGTH => Self::Indeterminate,
      _ => Self::Defined { length },
    }
  }
}

impl std::fmt::Display for ValueLength {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::Defined { length } => write!(f, "{} bytes", length),
      Self::Indeterminate => write!(f, "indeterminate"),
    }
  }
}
