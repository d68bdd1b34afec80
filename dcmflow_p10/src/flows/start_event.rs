use crate::dicom_part::MetaPart;
use crate::{DicomPart, StreamError};

use super::{strip_markers, DicomFlow, FlowContext};

/// Guarantees that the inner flow receives a `DicomStart` meta part before any
/// other part, including when the part stream is empty.
///
/// When an outer layer already sends `DicomStart` first, it is passed on and
/// nothing is synthesized.
///
pub struct StartEvent<F: DicomFlow> {
  inner: F,
  started: bool,
}

impl<F: DicomFlow> StartEvent<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      started: false,
    }
  }

  fn start(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    self.started = true;

    let mut outputs = self
      .inner
      .handle_part(&DicomPart::Meta(MetaPart::DicomStart), context)?;
    strip_markers(&mut outputs, is_start);

    Ok(outputs)
  }
}

fn is_start(part: &DicomPart) -> bool {
  matches!(part, DicomPart::Meta(MetaPart::DicomStart))
}

impl<F: DicomFlow> DicomFlow for StartEvent<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    if self.started {
      return self.inner.handle_part(part, context);
    }

    if is_start(part) {
      self.started = true;
      return self.inner.handle_part(part, context);
    }

    let mut outputs = self.start(context)?;
    outputs.extend(self.inner.handle_part(part, context)?);

    Ok(outputs)
  }

  fn end(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    let mut outputs = if self.started {
      vec![]
    } else {
      self.start(context)?
    };

    outputs.extend(self.inner.end(context)?);

    Ok(outputs)
  }
}

#[cfg(test)]
mod tests {
  use super::super::test_parts::*;
  use super::super::{DeferToPartFlow, IdentityFlow};
  use super::*;

  use dcmflow_core::dictionary;

  #[test]
  fn synthesizes_start_test() {
    let mut seen = vec![];

    {
      let mut flow =
        StartEvent::new(DeferToPartFlow::new(|part: &DicomPart, _: &_| {
          seen.push(part.to_string());
          Ok(vec![part.clone()])
        }));
      let mut context = FlowContext::default();

      let part = header(dictionary::PATIENT_ID.tag, 0);
      assert_eq!(
        flow.handle_part(&part, &mut context),
        Ok(vec![part.clone()])
      );
      assert_eq!(
        flow.handle_part(&part, &mut context),
        Ok(vec![part.clone()])
      );
    }

    assert_eq!(seen[0], "DicomStart (marker)");
    assert_eq!(seen.len(), 3);
  }

  #[test]
  fn synthesizes_start_for_empty_stream_test() {
    let mut count = 0;

    {
      let mut flow =
        StartEvent::new(DeferToPartFlow::new(|_: &DicomPart, _: &_| {
          count += 1;
          Ok(Vec::<DicomPart>::new())
        }));
      let mut context = FlowContext::default();

      flow.end(&mut context).unwrap();
      flow.end(&mut context).unwrap();
    }

    assert_eq!(count, 1);
  }

  #[test]
  fn passes_on_received_start_test() {
    let mut flow = StartEvent::new(StartEvent::new(IdentityFlow::new()));
    let mut context = FlowContext::default();

    let start = DicomPart::Meta(MetaPart::DicomStart);

    assert_eq!(flow.handle_part(&start, &mut context), Ok(vec![start]));
    assert_eq!(flow.end(&mut context), Ok(vec![]));
  }
}
