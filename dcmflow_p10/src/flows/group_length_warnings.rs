use dcmflow_core::dictionary;

use crate::{DicomPart, StreamError};

use super::{DicomFlow, FlowContext};

/// Logs a warning for parts that rely on lengths that are easily invalidated
/// when a data set is modified: group length elements outside the File Meta
/// Information, determinate-length sequences, and determinate-length items
/// outside encapsulated pixel data.
///
/// Warnings are logged with [`tracing`] unless the layer is made silent. Parts
/// are passed on unchanged either way.
///
pub struct GroupLengthWarnings<F: DicomFlow> {
  inner: F,
  silent: bool,
  warning_count: usize,
}

impl<F: DicomFlow> GroupLengthWarnings<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      silent: false,
      warning_count: 0,
    }
  }

  /// Sets whether warnings are suppressed.
  ///
  pub fn silent(mut self, silent: bool) -> Self {
    self.silent = silent;
    self
  }

  /// The number of parts that have been found to warrant a warning, whether
  /// or not it was logged.
  ///
  pub fn warning_count(&self) -> usize {
    self.warning_count
  }

  fn warn(&mut self, message: String) {
    self.warning_count += 1;

    if !self.silent {
      tracing::warn!("{}", message);
    }
  }
}

impl<F: DicomFlow> DicomFlow for GroupLengthWarnings<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    match part {
      DicomPart::Header(header)
        if header.tag.is_group_length()
          && header.tag != dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag =>
      {
        self.warn(format!(
          "Group length element {} may be invalidated by changes to the \
           data set",
          header.tag
        ))
      }

      DicomPart::Sequence(sequence) if !sequence.has_indeterminate_length() => {
        self.warn(format!(
          "Sequence {} has a determinate length of {} bytes",
          dictionary::tag_with_name(sequence.tag),
          sequence.length
        ))
      }

      DicomPart::Item(item)
        if !item.has_indeterminate_length()
          && context.in_fragments() != Some(true) =>
      {
        self.warn(format!(
          "Item {} has a determinate length of {} bytes",
          item.index, item.length
        ))
      }

      _ => (),
    }

    self.inner.handle_part(part, context)
  }

  fn end(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    self.inner.end(context)
  }
}
