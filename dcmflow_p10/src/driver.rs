//! Connects a [`ParseContext`] to a flow, so that bytes written to the driver
//! come out as the outputs of the flow.

use crate::flows::{DicomFlow, FlowContext, FlowRunner};
use crate::{ParseConfig, ParseContext, StreamError};

/// Parses bytes as they are written and runs the resulting parts through a
/// flow. The flow is ended as soon as the input has been fully parsed.
///
/// Parse errors and flow errors are both returned by [`Self::write_bytes`].
/// After an error, no further outputs are produced.
///
pub struct FlowDriver<F: DicomFlow> {
  parser: ParseContext,
  runner: FlowRunner<F>,
  failed: bool,
}

impl<F: DicomFlow> FlowDriver<F> {
  pub fn new(flow: F, config: Option<ParseConfig>) -> Self {
    Self {
      parser: ParseContext::new(config),
      runner: FlowRunner::new(flow),
      failed: false,
    }
  }

  /// Returns whether the input has been fully parsed and the flow ended.
  ///
  pub fn is_finished(&self) -> bool {
    self.parser.is_finished()
  }

  pub fn context(&self) -> &FlowContext {
    self.runner.context()
  }

  /// Writes the next bytes of the input, and returns the outputs of the flow
  /// for all parts that could be read. `done` marks the end of the input.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: Vec<u8>,
    done: bool,
  ) -> Result<Vec<F::Out>, StreamError> {
    let result = self.write_bytes_inner(bytes, done);

    if result.is_err() {
      self.failed = true;
    }

    result
  }

  fn write_bytes_inner(
    &mut self,
    bytes: Vec<u8>,
    done: bool,
  ) -> Result<Vec<F::Out>, StreamError> {
    if self.failed {
      return Err(StreamError::WriteAfterCompletion);
    }

    self.parser.write_bytes(bytes, done)?;

    let mut outputs = vec![];

    loop {
      match self.parser.read_parts() {
        Ok(parts) => {
          for part in parts.iter() {
            outputs.extend(self.runner.add_part(part)?);
          }

          if self.parser.is_finished() {
            outputs.extend(self.runner.end()?);
            return Ok(outputs);
          }
        }

        Err(e) if e.is_data_required() => return Ok(outputs),

        Err(e) => return Err(e),
      }
    }
  }
}
