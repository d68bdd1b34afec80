//! Streaming parser for DICOM data, and composable flows that consume the
//! parts it produces.
//!
//! A [`ParseContext`] turns bytes into a stream of [`DicomPart`]s as the bytes
//! become available, without ever needing the whole input in memory. The
//! [`flows`] module stacks capability layers around a consumer of those parts,
//! and a [`FlowDriver`] connects the two.

pub mod dicom_part;
pub mod driver;
pub mod flows;
pub mod parse;
pub mod parse_config;
pub mod stream_error;

mod internal;

use std::fs::File;
use std::io::Read;

pub use dicom_part::{
  DeflatedChunkPart, DicomPart, FragmentsPart, HeaderPart, ItemDelimitationPart,
  ItemPart, MetaPart, PreamblePart, SequenceDelimitationPart, SequencePart,
  UnknownPart, ValueChunkPart, INDETERMINATE_LENGTH,
};
pub use driver::FlowDriver;
pub use flows::{DicomFlow, FlowContext, FlowOutput, FlowRunner};
pub use parse::ParseContext;
pub use parse_config::ParseConfig;
pub use stream_error::StreamError;

/// Parses a complete in-memory input into its parts.
///
pub fn parse_bytes(
  bytes: Vec<u8>,
  config: Option<ParseConfig>,
) -> Result<Vec<DicomPart>, StreamError> {
  let mut context = ParseContext::new(config);
  context.write_bytes(bytes, true)?;

  let mut parts = vec![];

  while !context.is_finished() {
    parts.extend(context.read_parts()?);
  }

  Ok(parts)
}

/// Reads the next parts from a read stream. This repeatedly reads bytes from
/// the read stream in chunks of the configured buffer size until at least one
/// part is made available by the parse context or an error occurs. Once the
/// input has been fully parsed an empty list is returned.
///
pub fn read_parts_from_stream(
  stream: &mut dyn Read,
  context: &mut ParseContext,
) -> Result<Vec<DicomPart>, StreamError> {
  loop {
    match context.read_parts() {
      Ok(parts) => {
        if parts.is_empty() && !context.is_finished() {
          continue;
        } else {
          return Ok(parts);
        }
      }

      // If the parse context needs more data then read bytes from the stream,
      // write them to the parse context, and try again
      Err(StreamError::DataRequired { .. }) => {
        let mut buffer = vec![0u8; context.config().buffer_size_hint];
        match stream.read(&mut buffer) {
          Ok(0) => context.write_bytes(vec![], true)?,

          Ok(bytes_count) => {
            buffer.resize(bytes_count, 0);
            context.write_bytes(buffer, false)?;
          }

          Err(e) => {
            return Err(StreamError::FileError {
              when: "Reading from stream".to_string(),
              details: e.to_string(),
            })
          }
        }
      }

      e => return e,
    }
  }
}

/// Runs all data in a read stream through a flow, and returns the flow's
/// outputs.
///
pub fn run_stream<F: DicomFlow>(
  stream: &mut dyn Read,
  config: Option<ParseConfig>,
  flow: F,
) -> Result<Vec<F::Out>, StreamError> {
  let buffer_size = config.unwrap_or_default().buffer_size_hint;
  let mut driver = FlowDriver::new(flow, config);

  let mut outputs = vec![];

  while !driver.is_finished() {
    let mut buffer = vec![0u8; buffer_size];

    match stream.read(&mut buffer) {
      Ok(0) => outputs.extend(driver.write_bytes(vec![], true)?),

      Ok(bytes_count) => {
        buffer.resize(bytes_count, 0);
        outputs.extend(driver.write_bytes(buffer, false)?);
      }

      Err(e) => {
        return Err(StreamError::FileError {
          when: "Reading from stream".to_string(),
          details: e.to_string(),
        })
      }
    }
  }

  Ok(outputs)
}

/// Runs the contents of a file through a flow, and returns the flow's outputs.
///
pub fn run_file<F: DicomFlow>(
  filename: &str,
  config: Option<ParseConfig>,
  flow: F,
) -> Result<Vec<F::Out>, StreamError> {
  match File::open(filename) {
    Ok(mut file) => run_stream(&mut file, config, flow),
    Err(e) => Err(StreamError::FileError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use flows::{full_stack, IdentityFlow};

  fn data_set() -> Vec<u8> {
    let mut bytes = vec![0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x04, 0x00];
    bytes.extend_from_slice(b"1234");
    bytes
  }

  #[test]
  fn parse_bytes_test() {
    let parts = parse_bytes(data_set(), None).unwrap();

    assert_eq!(parts.len(), 2);
    assert_eq!(parse_bytes(vec![], None), Ok(vec![]));
  }

  #[test]
  fn read_parts_from_stream_test() {
    let config = ParseConfig::default().buffer_size_hint(3);
    let mut context = ParseContext::new(Some(config));
    let bytes = data_set();
    let mut stream = bytes.as_slice();

    let mut parts = vec![];
    loop {
      let new_parts =
        read_parts_from_stream(&mut stream, &mut context).unwrap();
      if new_parts.is_empty() {
        break;
      }

      parts.extend(new_parts);
    }

    assert_eq!(
      parts.iter().flat_map(|p| p.bytes().to_vec()).collect::<Vec<u8>>(),
      bytes
    );
  }

  #[test]
  fn run_stream_test() {
    let bytes = data_set();
    let mut stream = bytes.as_slice();

    let outputs =
      run_stream(&mut stream, None, full_stack(IdentityFlow::new())).unwrap();

    assert_eq!(outputs, parse_bytes(data_set(), None).unwrap());
  }

  #[test]
  fn run_file_error_test() {
    assert!(matches!(
      run_file("missing.dcm", None, IdentityFlow::new()),
      Err(StreamError::FileError { .. })
    ));
  }
}
