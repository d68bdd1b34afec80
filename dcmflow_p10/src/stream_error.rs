//! Defines the type used to describe errors that can occur when parsing DICOM
//! data and when running parts through flows.

use crate::internal::byte_cursor::CursorError;
use crate::DicomPart;

/// An error that occurred when parsing DICOM data or processing its parts.
///
#[derive(Clone, Debug, PartialEq)]
pub enum StreamError {
  /// The start of the input couldn't be interpreted as DICOM data in any
  /// supported encoding.
  NotDicom { details: String },

  /// The input is encoded as implicit VR big endian, which is not a valid
  /// DICOM encoding.
  ImplicitVrBigEndian,

  /// More data needs to be written to the parse context before the next part
  /// can be read. This is not a failure.
  DataRequired { when: String },

  /// The end of the input was reached in the middle of a part, meaning the
  /// input is truncated.
  DataEndedUnexpectedly { when: String, offset: u64 },

  /// The input contains data that can't be parsed.
  DataInvalid {
    when: String,
    details: String,
    offset: Option<u64>,
  },

  /// Deflated data in the input couldn't be inflated.
  InflateFailed { when: String, offset: u64 },

  /// A part was received by a flow that is invalid at its position in the
  /// part stream, or a flow was stacked without the flows it depends on.
  PartStreamInvalid {
    when: String,
    details: String,
    part: DicomPart,
  },

  /// Bytes were written to a parse context after its final bytes had already
  /// been written.
  WriteAfterCompletion,

  /// Reading from an underlying file or stream failed.
  FileError { when: String, details: String },
}

impl std::fmt::Display for StreamError {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "DICOM stream error: {}", self.name())
  }
}

impl StreamError {
  /// Returns the name of the error as a human-readable string.
  ///
  pub fn name(&self) -> String {
    match self {
      StreamError::NotDicom { .. } => "Not DICOM data".to_string(),
      StreamError::ImplicitVrBigEndian => {
        "Implicit VR big endian is not supported".to_string()
      }
      StreamError::DataRequired { .. } => "Data required".to_string(),
      StreamError::DataEndedUnexpectedly { .. } => {
        "Unexpected end of data".to_string()
      }
      StreamError::DataInvalid { .. } => "Invalid data".to_string(),
      StreamError::InflateFailed { .. } => "Inflate failed".to_string(),
      StreamError::PartStreamInvalid { .. } => {
        "Part stream invalid".to_string()
      }
      StreamError::WriteAfterCompletion => {
        "Write after completion".to_string()
      }
      StreamError::FileError { .. } => "File I/O failure".to_string(),
    }
  }

  /// Returns whether this error only signals that more data is needed.
  ///
  pub fn is_data_required(&self) -> bool {
    matches!(self, StreamError::DataRequired { .. })
  }

  /// Converts a byte cursor error into a stream error. `offset` is the number
  /// of bytes read when the error occurred.
  ///
  pub(crate) fn from_cursor_error(
    error: CursorError,
    when: &str,
    offset: u64,
  ) -> Self {
    match error {
      CursorError::DataRequired => StreamError::DataRequired {
        when: when.to_string(),
      },
      CursorError::DataEnd => StreamError::DataEndedUnexpectedly {
        when: when.to_string(),
        offset,
      },
      CursorError::InflateError => StreamError::InflateFailed {
        when: when.to_string(),
        offset,
      },
      CursorError::WriteAfterCompletion => StreamError::WriteAfterCompletion,
    }
  }
}

impl dcmflow_core::DcmflowError for StreamError {
  /// Returns lines of text that describe a stream error in a human-readable
  /// format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![];

    lines.push(format!("DICOM stream error {}", task_description));
    lines.push("".to_string());

    lines.push(format!("  Error: {}", self.name()));

    match self {
      StreamError::DataRequired { when }
      | StreamError::DataEndedUnexpectedly { when, .. }
      | StreamError::DataInvalid { when, .. }
      | StreamError::InflateFailed { when, .. }
      | StreamError::PartStreamInvalid { when, .. }
      | StreamError::FileError { when, .. } => {
        lines.push(format!("  When: {}", when));
      }

      _ => (),
    };

    match self {
      StreamError::NotDicom { details }
      | StreamError::DataInvalid { details, .. }
      | StreamError::FileError { details, .. } => {
        lines.push(format!("  Details: {}", details));
      }

      StreamError::PartStreamInvalid { details, part, .. } => {
        lines.push(format!("  Details: {}", details));
        lines.push(format!("  Part: {}", part));
      }

      _ => (),
    };

    match self {
      StreamError::DataEndedUnexpectedly { offset, .. }
      | StreamError::InflateFailed { offset, .. }
      | StreamError::DataInvalid {
        offset: Some(offset),
        ..
      } => {
        lines.push(format!("  Offset: 0x{:X}", offset));
      }

      _ => (),
    };

    lines
  }
}
