use crate::dicom_part::MetaPart;
use crate::{DicomPart, StreamError};

use super::{strip_markers, DicomFlow, FlowContext};

/// Guarantees that the inner flow receives a `DicomEnd` meta part as its last
/// part when the flow is ended.
///
/// When an outer layer already sends `DicomEnd`, it is passed on and nothing
/// is synthesized.
///
pub struct EndEvent<F: DicomFlow> {
  inner: F,
  ended: bool,
}

impl<F: DicomFlow> EndEvent<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      ended: false,
    }
  }
}

fn is_end(part: &DicomPart) -> bool {
  matches!(part, DicomPart::Meta(MetaPart::DicomEnd))
}

impl<F: DicomFlow> DicomFlow for EndEvent<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    if is_end(part) {
      self.ended = true;
    }

    self.inner.handle_part(part, context)
  }

  fn end(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    let mut outputs = vec![];

    if !self.ended {
      self.ended = true;

      outputs = self
        .inner
        .handle_part(&DicomPart::Meta(MetaPart::DicomEnd), context)?;
      strip_markers(&mut outputs, is_end);
    }

    outputs.extend(self.inner.end(context)?);

    Ok(outputs)
  }
}

#[cfg(test)]
mod tests {
  use super::super::{DeferToPartFlow, IdentityFlow};
  use super::*;

  #[test]
  fn synthesizes_end_test() {
    let mut seen = vec![];

    {
      let mut flow =
        EndEvent::new(DeferToPartFlow::new(|part: &DicomPart, _: &_| {
          seen.push(part.clone());
          Ok(vec![part.clone()])
        }));
      let mut context = FlowContext::default();

      assert_eq!(flow.end(&mut context), Ok(vec![]));
      assert_eq!(flow.end(&mut context), Ok(vec![]));
    }

    assert_eq!(seen, vec![DicomPart::Meta(MetaPart::DicomEnd)]);
  }

  #[test]
  fn passes_on_received_end_test() {
    let mut flow = EndEvent::new(IdentityFlow::new());
    let mut context = FlowContext::default();

    let end = DicomPart::Meta(MetaPart::DicomEnd);

    assert_eq!(flow.handle_part(&end, &mut context), Ok(vec![end]));
    assert_eq!(flow.end(&mut context), Ok(vec![]));
  }
}
