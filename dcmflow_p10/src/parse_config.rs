/// Configuration used when parsing DICOM data with a [`crate::ParseContext`].
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParseConfig {
  pub(crate) chunk_size: usize,
  pub(crate) inflate: bool,
  pub(crate) buffer_size_hint: usize,
}

impl Default for ParseConfig {
  fn default() -> Self {
    Self {
      chunk_size: 8192,
      inflate: true,
      buffer_size_hint: 64 * 1024,
    }
  }
}

impl ParseConfig {
  /// The maximum size in bytes of the data carried by a single
  /// [`crate::DicomPart::ValueChunk`] or [`crate::DicomPart::DeflatedChunk`]
  /// part. Longer values are split across multiple parts, and only the final
  /// chunk of a value has its `last` flag set.
  ///
  /// The chunk size only changes how values are divided. It never changes the
  /// parts emitted for headers, items or delimitations.
  ///
  /// By default the chunk size is 8 KiB. The minimum is one byte.
  ///
  pub fn chunk_size(mut self, value: usize) -> Self {
    self.chunk_size = value.max(1);
    self
  }

  /// Whether data sets stored in a deflated transfer syntax are inflated
  /// automatically and then parsed. When this is `false` everything after the
  /// File Meta Information is emitted as opaque
  /// [`crate::DicomPart::DeflatedChunk`] parts.
  ///
  /// By default deflated data is inflated.
  ///
  pub fn inflate(mut self, value: bool) -> Self {
    self.inflate = value;
    self
  }

  /// The number of bytes read at a time when parsing from a stream, which is
  /// also the initial capacity of the parse buffer.
  ///
  /// By default this is 64 KiB.
  ///
  pub fn buffer_size_hint(mut self, value: usize) -> Self {
    self.buffer_size_hint = value.max(1);
    self
  }
}
