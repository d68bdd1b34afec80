use crate::{DicomPart, StreamError};

use super::{require, strip_markers, DicomFlow, FlowContext};

/// Guarantees that every header and every fragment item is followed by at
/// least one value chunk, by sending a zero-byte marker chunk to the inner flow
/// after those with a zero length. The markers are removed from the returned
/// outputs.
///
/// Requires [`super::InFragments`] to be stacked outside this layer. Only the
/// outermost instance of this layer in a stack is active.
///
pub struct GuaranteedValueEvent<F: DicomFlow> {
  inner: F,
  active: Option<bool>,
}

impl<F: DicomFlow> GuaranteedValueEvent<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      active: None,
    }
  }
}

fn is_value_chunk(part: &DicomPart) -> bool {
  matches!(part, DicomPart::ValueChunk(_))
}

impl<F: DicomFlow> DicomFlow for GuaranteedValueEvent<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    let active = *self
      .active
      .get_or_insert_with(|| context.claim_value_events());

    if !active {
      return self.inner.handle_part(part, context);
    }

    require(
      context.in_fragments().is_some(),
      "guaranteed value event",
      "Fragments must be tracked by an outer flow",
      part,
    )?;

    let needs_marker = match part {
      DicomPart::Header(header) => header.length == 0,
      DicomPart::Item(item) => {
        item.length == 0 && context.in_fragments() == Some(true)
      }
      _ => false,
    };

    let mut outputs = self.inner.handle_part(part, context)?;

    if needs_marker {
      let marker = DicomPart::value_marker(part.big_endian());
      outputs.extend(self.inner.handle_part(&marker, context)?);

      strip_markers(&mut outputs, is_value_chunk);
    }

    Ok(outputs)
  }

  fn end(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    self.inner.end(context)
  }
}

#[cfg(test)]
mod tests {
  use super::super::test_parts::*;
  use super::super::{DeferToPartFlow, InFragments};
  use super::*;

  use dcmflow_core::dictionary;

  fn run(parts: &[DicomPart]) -> (Vec<String>, Vec<DicomPart>) {
    let mut seen = vec![];
    let mut outputs = vec![];

    {
      let mut flow = InFragments::new(GuaranteedValueEvent::new(
        DeferToPartFlow::new(|part: &DicomPart, _: &_| {
          seen.push(part.to_string());
          Ok(vec![part.clone()])
        }),
      ));
      let mut context = FlowContext::default();

      for part in parts {
        outputs.extend(flow.handle_part(part, &mut context).unwrap());
      }
    }

    (seen, outputs)
  }

  #[test]
  fn zero_length_header_test() {
    let parts = vec![header(dictionary::PATIENT_NAME.tag, 0)];

    let (seen, outputs) = run(&parts);

    assert_eq!(
      seen,
      vec![
        "Header: (0010,0010) PatientName, vr: LO, length: 0 bytes",
        "ValueChunk: [], last: true (marker)",
      ]
    );
    assert_eq!(outputs, parts);
  }

  #[test]
  fn nonzero_length_header_test() {
    let (seen, _) = run(&[header(dictionary::PATIENT_NAME.tag, 2), value(2)]);

    assert_eq!(seen.len(), 2);
  }

  #[test]
  fn zero_length_fragment_test() {
    let (seen, _) = run(&[
      fragments(dictionary::PIXEL_DATA.tag),
      item(1, 0),
      sequence_delimitation(),
    ]);

    assert_eq!(seen[2], "ValueChunk: [], last: true (marker)");
    assert_eq!(seen.len(), 4);
  }

  #[test]
  fn zero_length_sequence_item_test() {
    let (seen, _) = run(&[
      sequence(dictionary::REFERENCED_SERIES_SEQUENCE.tag, 0xFFFFFFFF),
      item(1, 0),
    ]);

    assert_eq!(seen.len(), 2);
  }
}
