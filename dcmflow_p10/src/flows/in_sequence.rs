use crate::{DicomPart, StreamError};

use super::{require, DicomFlow, FlowContext};

/// Tracks how many sequences are open, and publishes it through
/// [`FlowContext::sequence_depth`]. Encapsulated pixel data is not counted as
/// a sequence.
///
/// Requires [`super::InFragments`] and [`super::GuaranteedDelimitationEvents`]
/// to be stacked outside this layer, as determinate-length sequences are only
/// seen to end through the delimitations that layer synthesizes.
///
pub struct InSequence<F: DicomFlow> {
  inner: F,
  depth: usize,
}

impl<F: DicomFlow> InSequence<F> {
  pub fn new(inner: F) -> Self {
    Self { inner, depth: 0 }
  }
}

impl<F: DicomFlow> DicomFlow for InSequence<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    require(
      context.in_fragments().is_some()
        && context.delimitation_events_guaranteed(),
      "in sequence",
      "Fragments and delimitation events must be provided by outer flows",
      part,
    )?;

    match part {
      DicomPart::Sequence(_) => self.depth += 1,

      DicomPart::SequenceDelimitation(_)
        if context.in_fragments() == Some(false) =>
      {
        self.depth = self.depth.saturating_sub(1)
      }

      _ => (),
    }

    context.set_sequence_depth(self.depth);
    self.inner.handle_part(part, context)
  }

  fn end(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    self.inner.end(context)
  }
}
