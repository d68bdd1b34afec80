use crate::{DicomPart, StreamError};

use super::{require, strip_markers, DicomFlow, FlowContext};

/// Guarantees that every sequence and every item in a sequence is followed by
/// a delimitation part, including those that have a determinate length and so
/// have no delimitation in the input.
///
/// Determinate-length sequences and items are tracked by counting down the
/// bytes of the parts inside them. When one is exhausted, a zero-byte marker
/// delimitation is sent to the inner flow right after the part that exhausted
/// it, innermost first. The markers are removed from the returned outputs.
///
/// Requires [`super::InFragments`] to be stacked outside this layer. Only the
/// outermost instance of this layer in a stack is active, inner ones pass
/// parts through unchanged.
///
pub struct GuaranteedDelimitationEvents<F: DicomFlow> {
  inner: F,
  active: Option<bool>,
  open_scopes: Vec<OpenScope>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ScopeKind {
  Sequence,
  Item { index: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct OpenScope {
  kind: ScopeKind,
  bytes_remaining: i64,
  big_endian: bool,
}

impl<F: DicomFlow> GuaranteedDelimitationEvents<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      active: None,
      open_scopes: vec![],
    }
  }

  fn is_active(&mut self, context: &mut FlowContext) -> bool {
    *self
      .active
      .get_or_insert_with(|| context.claim_delimitation_events())
  }

  /// Delimits the innermost open scopes whose bytes have all been consumed.
  ///
  fn close_exhausted_scopes(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    let mut outputs = vec![];

    while let Some(scope) = self.open_scopes.last().copied() {
      if scope.bytes_remaining > 0 {
        break;
      }

      self.open_scopes.pop();

      let marker = match scope.kind {
        ScopeKind::Sequence => {
          DicomPart::sequence_delimitation_marker(scope.big_endian)
        }
        ScopeKind::Item { index } => {
          DicomPart::item_delimitation_marker(index, scope.big_endian)
        }
      };

      outputs.extend(self.inner.handle_part(&marker, context)?);
    }

    Ok(outputs)
  }
}

fn is_delimitation(part: &DicomPart) -> bool {
  matches!(
    part,
    DicomPart::ItemDelimitation(_) | DicomPart::SequenceDelimitation(_)
  )
}

impl<F: DicomFlow> DicomFlow for GuaranteedDelimitationEvents<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    if !self.is_active(context) {
      return self.inner.handle_part(part, context);
    }

    require(
      context.in_fragments().is_some(),
      "guaranteed delimitation events",
      "Fragments must be tracked by an outer flow",
      part,
    )?;

    let length = part.bytes().len() as i64;
    for scope in self.open_scopes.iter_mut() {
      scope.bytes_remaining -= length;
    }

    match part {
      DicomPart::Sequence(sequence) if !sequence.has_indeterminate_length() => {
        self.open_scopes.push(OpenScope {
          kind: ScopeKind::Sequence,
          bytes_remaining: i64::from(sequence.length),
          big_endian: sequence.big_endian,
        })
      }

      DicomPart::Item(item)
        if !item.has_indeterminate_length()
          && context.in_fragments() == Some(false) =>
      {
        self.open_scopes.push(OpenScope {
          kind: ScopeKind::Item { index: item.index },
          bytes_remaining: i64::from(item.length),
          big_endian: item.big_endian,
        })
      }

      _ => (),
    }

    let mut outputs = self.inner.handle_part(part, context)?;
    outputs.extend(self.close_exhausted_scopes(context)?);

    strip_markers(&mut outputs, is_delimitation);

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
  use super::super::{DeferToPartFlow, IdentityFlow, InFragments};
  use super::*;

  use dcmflow_core::dictionary;

  fn run(parts: &[DicomPart]) -> (Vec<String>, Vec<DicomPart>) {
    let mut seen = vec![];
    let mut outputs = vec![];

    {
      let mut flow = InFragments::new(GuaranteedDelimitationEvents::new(
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
  fn delimits_determinate_sequence_test() {
    let parts = vec![
      sequence(dictionary::REFERENCED_SERIES_SEQUENCE.tag, 24),
      item(1, 16),
      header(dictionary::SERIES_INSTANCE_UID.tag, 8),
      value(8),
      header(dictionary::PATIENT_ID.tag, 0),
    ];

    let (seen, outputs) = run(&parts);

    assert_eq!(
      seen,
      vec![
        "Sequence: (0008,1115) ReferencedSeriesSequence, length: 24 bytes",
        "Item: index: 1, length: 16 bytes",
        "Header: (0020,000E) SeriesInstanceUID, vr: LO, length: 8 bytes",
        "ValueChunk: [78 78 78 78 78 78 78 78], last: true",
        "ItemDelimitation: index: 1 (marker)",
        "SequenceDelimitation (marker)",
        "Header: (0010,0020) PatientID, vr: LO, length: 0 bytes",
      ]
    );

    assert_eq!(outputs, parts);
  }

  #[test]
  fn delimits_empty_sequence_test() {
    let (seen, _) =
      run(&[sequence(dictionary::REFERENCED_SERIES_SEQUENCE.tag, 0)]);

    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1], "SequenceDelimitation (marker)");
  }

  #[test]
  fn passes_on_input_delimitations_test() {
    let parts = vec![
      sequence(dictionary::REFERENCED_SERIES_SEQUENCE.tag, 0xFFFFFFFF),
      item(1, 0xFFFFFFFF),
      item_delimitation(1),
      sequence_delimitation(),
    ];

    let (seen, outputs) = run(&parts);

    assert_eq!(seen.len(), 4);
    assert_eq!(outputs, parts);
  }

  #[test]
  fn ignores_fragment_items_test() {
    let (seen, _) = run(&[
      fragments(dictionary::PIXEL_DATA.tag),
      item(1, 0),
      sequence_delimitation(),
    ]);

    assert_eq!(seen.len(), 3);
  }

  #[test]
  fn requires_in_fragments_test() {
    let mut flow = GuaranteedDelimitationEvents::new(IdentityFlow::new());
    let mut context = FlowContext::default();

    assert!(matches!(
      flow.handle_part(&item(1, 0), &mut context),
      Err(StreamError::PartStreamInvalid { .. })
    ));
  }

  #[test]
  fn only_outermost_is_active_test() {
    let mut flow = InFragments::new(GuaranteedDelimitationEvents::new(
      GuaranteedDelimitationEvents::new(IdentityFlow::new()),
    ));
    let mut context = FlowContext::default();

    let part = sequence(dictionary::REFERENCED_SERIES_SEQUENCE.tag, 0);

    assert_eq!(flow.handle_part(&part, &mut context), Ok(vec![part]));
    assert!(context.delimitation_events_guaranteed());
  }
}
