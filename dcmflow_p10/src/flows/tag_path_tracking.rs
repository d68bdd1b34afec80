use dcmflow_core::{TagPath, TagPathNode};

use crate::{DicomPart, StreamError};

use super::{require, DicomFlow, FlowContext};

/// Tracks the tag path of each part, and publishes it through
/// [`FlowContext::tag_path`].
///
/// Headers, sequences and fragments get the path of their data element. Items
/// and delimitations in sequences get item, item end and sequence end paths.
/// Value chunks, fragment items and the delimitation that ends fragments keep
/// the path of the data element they belong to.
///
/// Requires [`super::InFragments`], [`super::GuaranteedDelimitationEvents`]
/// and [`super::GuaranteedValueEvent`] to be stacked outside this layer.
///
pub struct TagPathTracking<F: DicomFlow> {
  inner: F,
  tag_path: TagPath,
}

impl<F: DicomFlow> TagPathTracking<F> {
  pub fn new(inner: F) -> Self {
    Self {
      inner,
      tag_path: TagPath::empty(),
    }
  }

  /// Returns the path of the next part, or `None` if the part keeps the
  /// current path.
  ///
  fn next_tag_path(
    &self,
    part: &DicomPart,
    in_fragments: bool,
  ) -> Option<TagPath> {
    let path = &self.tag_path;

    // Data elements extend the current item, or else replace the last node
    let trunk = || path.as_trunk().unwrap_or_else(|| path.previous());

    match part {
      DicomPart::Header(header) => Some(trunk().then_tag(header.tag)),
      DicomPart::Fragments(fragments) => Some(trunk().then_tag(fragments.tag)),
      DicomPart::Unknown(unknown) if !in_fragments => {
        Some(trunk().then_tag(unknown.tag))
      }
      DicomPart::Sequence(sequence) => {
        Some(trunk().then_sequence(sequence.tag))
      }

      DicomPart::Item(item) if !in_fragments => {
        let tag = path.tag()?;
        Some(path.previous().then_item(tag, item.index).into())
      }

      DicomPart::ItemDelimitation(delimitation) if !in_fragments => {
        match path.node()? {
          TagPathNode::Item(tag, _) => {
            Some(path.previous().then_item_end(tag, delimitation.index))
          }
          _ => {
            let item = path.previous();
            match item.node()? {
              TagPathNode::Item(tag, _) => {
                Some(item.previous().then_item_end(tag, delimitation.index))
              }
              _ => None,
            }
          }
        }
      }

      DicomPart::SequenceDelimitation(_) if !in_fragments => {
        match path.node()? {
          TagPathNode::Sequence(tag) | TagPathNode::ItemEnd(tag, _) => {
            Some(path.previous().then_sequence_end(tag))
          }

          // An item that was never delimited
          TagPathNode::Item(tag, _) => {
            Some(path.previous().then_sequence_end(tag))
          }

          _ => {
            let item = path.previous();
            match item.node()? {
              TagPathNode::Item(tag, _) => {
                Some(item.previous().then_sequence_end(tag))
              }
              _ => None,
            }
          }
        }
      }

      _ => None,
    }
  }
}

impl<F: DicomFlow> DicomFlow for TagPathTracking<F> {
  type Out = F::Out;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    require(
      context.in_fragments().is_some()
        && context.delimitation_events_guaranteed()
        && context.value_events_guaranteed(),
      "tag path tracking",
      "Fragments, delimitation events and value events must be provided by \
       outer flows",
      part,
    )?;

    let in_fragments = context.in_fragments() == Some(true);
    if let Some(tag_path) = self.next_tag_path(part, in_fragments) {
      self.tag_path = tag_path;
    }

    context.set_tag_path(self.tag_path.clone());
    self.inner.handle_part(part, context)
  }

  fn end(
    &mut self,
    context: &mut FlowContext,
  ) -> Result<Vec<F::Out>, StreamError> {
    self.inner.end(context)
  }
}
