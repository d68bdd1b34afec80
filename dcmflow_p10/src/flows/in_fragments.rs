use crate::{DicomPart, StreamError};

use super::{DicomFlow, FlowContext};

/// Tracks whether parts are inside encapsulated pixel data, and publishes it
/// through [`FlowContext::in_fragments`].
///
/// The fragments part itself and the sequence delimitation that ends the
/// fragments are both reported as being in fragments.
///
pub struct InFragments<F: DicomFlow> {
  inner: F,
  in_fragments: bool,
}

impl<F: DicomFlow> InFragments<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      in_fragments: false,
    }
  }
}

impl<F: DicomFlow> DicomFlow for InFragments<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    match part {
      DicomPart::Fragments(_) => self.in_fragments = true,

      DicomPart::SequenceDelimitation(_) if self.in_fragments => {
        context.set_in_fragments(true);
        let outputs = self.inner.handle_part(part, context);

        self.in_fragments = false;
        context.set_in_fragments(false);

        return outputs;
      }

      _ => (),
    }

    context.set_in_fragments(self.in_fragments);
    self.inner.handle_part(part, context)
  }

  fn end(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    context.set_in_fragments(self.in_fragments);
    self.inner.end(context)
  }
}
