//! Flows consume the parts produced by a [`crate::ParseContext`].
//!
//! A flow is built by stacking capability layers around a consumer. Each
//! layer wraps the next one inward and adds one guarantee about the part
//! stream the inner layers see, e.g. that every determinate-length item is
//! followed by an item delimitation. Parts travel from the outermost layer
//! inward, and outputs travel back outward.
//!
//! Layers expose their state to the layers inside them through the
//! [`FlowContext`]. Some layers depend on that state and fail with
//! [`StreamError::PartStreamInvalid`] when the layers they rely on aren't
//! stacked outside them. The order used by [`full_stack`] satisfies every
//! dependency:
//!
//! 1. [`InFragments`]
//! 2. [`GroupLengthWarnings`]
//! 3. [`StartEvent`]
//! 4. [`EndEvent`]
//! 5. [`GuaranteedDelimitationEvents`]
//! 6. [`GuaranteedValueEvent`]
//! 7. [`InSequence`]
//! 8. [`TagPathTracking`]
//! 9. the consumer
//!
//! Layers that synthesize marker parts remove them from the outputs they
//! return, so markers are only visible inside the layer that asked for them.

pub mod defer_to_part_flow;
pub mod end_event;
pub mod group_length_warnings;
pub mod guaranteed_delimitation_events;
pub mod guaranteed_value_event;
pub mod identity_flow;
pub mod in_fragments;
pub mod in_sequence;
pub mod start_event;
pub mod tag_path_tracking;

use dcmflow_core::TagPath;

use crate::{DicomPart, StreamError};

pub use defer_to_part_flow::DeferToPartFlow;
pub use end_event::EndEvent;
pub use group_length_warnings::GroupLengthWarnings;
pub use guaranteed_delimitation_events::GuaranteedDelimitationEvents;
pub use guaranteed_value_event::GuaranteedValueEvent;
pub use identity_flow::IdentityFlow;
pub use in_fragments::InFragments;
pub use in_sequence::InSequence;
pub use start_event::StartEvent;
pub use tag_path_tracking::TagPathTracking;

/// A consumer of parts, optionally wrapped by capability layers.
///
pub trait DicomFlow {
  type Out: FlowOutput;

  /// Handles the next part and returns any outputs it produces.
  ///
  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<Self::Out>, StreamError>;

  /// Called once after the last part.
  ///
  fn end(
    &mut self,
    _context: &mut FlowContext,
  ) -> Result<Vec<Self::Out>, StreamError> {
    Ok(vec![])
  }
}

/// The outputs of a flow. Outputs that are parts are recognized by layers so
/// they can remove the markers they synthesized.
///
pub trait FlowOutput {
  fn as_part(&self) -> Option<&DicomPart> {
    None
  }
}

impl FlowOutput for DicomPart {
  fn as_part(&self) -> Option<&DicomPart> {
    Some(self)
  }
}

impl FlowOutput for TagPath {}

impl FlowOutput for String {}

/// State shared by capability layers with the layers inside them. Values are
/// `None` when no layer that maintains them is stacked outside the reader.
///
#[derive(Clone, Debug, Default)]
pub struct FlowContext {
  in_fragments: Option<bool>,
  sequence_depth: Option<usize>,
  tag_path: Option<TagPath>,
  value_events_guaranteed: bool,
  delimitation_events_guaranteed: bool,
}

impl FlowContext {
  /// Whether the current part is inside encapsulated pixel data. Maintained
  /// by [`InFragments`].
  ///
  pub fn in_fragments(&self) -> Option<bool> {
    self.in_fragments
  }

  /// The number of open sequences, not counting encapsulated pixel data.
  /// Maintained by [`InSequence`].
  ///
  pub fn sequence_depth(&self) -> Option<usize> {
    self.sequence_depth
  }

  /// Whether the current part is inside at least one sequence. Maintained by
  /// [`InSequence`].
  ///
  pub fn in_sequence(&self) -> Option<bool> {
    self.sequence_depth.map(|depth| depth > 0)
  }

  /// The tag path of the current part. Maintained by [`TagPathTracking`].
  ///
  pub fn tag_path(&self) -> Option<&TagPath> {
    self.tag_path.as_ref()
  }

  /// Whether a [`GuaranteedValueEvent`] layer is active.
  ///
  pub fn value_events_guaranteed(&self) -> bool {
    self.value_events_guaranteed
  }

  /// Whether a [`GuaranteedDelimitationEvents`] layer is active.
  ///
  pub fn delimitation_events_guaranteed(&self) -> bool {
    self.delimitation_events_guaranteed
  }

  pub(crate) fn set_in_fragments(&mut self, value: bool) {
    self.in_fragments = Some(value);
  }

  pub(crate) fn set_sequence_depth(&mut self, value: usize) {
    self.sequence_depth = Some(value);
  }

  pub(crate) fn set_tag_path(&mut self, value: TagPath) {
    self.tag_path = Some(value);
  }

  /// Claims the value event guarantee. Returns false when another layer has
  /// already claimed it.
  ///
  pub(crate) fn claim_value_events(&mut self) -> bool {
    !std::mem::replace(&mut self.value_events_guaranteed, true)
  }

  /// Claims the delimitation event guarantee. Returns false when another
  /// layer has already claimed it.
  ///
  pub(crate) fn claim_delimitation_events(&mut self) -> bool {
    !std::mem::replace(&mut self.delimitation_events_guaranteed, true)
  }
}

/// Returns a [`StreamError::PartStreamInvalid`] error unless `condition`
/// holds.
///
pub(crate) fn require(
  condition: bool,
  flow: &str,
  details: &str,
  part: &DicomPart,
) -> Result<(), StreamError> {
  if condition {
    Ok(())
  } else {
    Err(StreamError::PartStreamInvalid {
      when: format!("Handling part in {}", flow),
      details: details.to_string(),
      part: part.clone(),
    })
  }
}

/// Removes the markers matching `is_own_marker` from a list of outputs.
///
pub(crate) fn strip_markers<O: FlowOutput>(
  outputs: &mut Vec<O>,
  is_own_marker: impl Fn(&DicomPart) -> bool,
) {
  outputs.retain(|output| match output.as_part() {
    Some(part) => !(part.is_marker() && is_own_marker(part)),
    None => true,
  });
}

/// Drives a flow with parts, owning the [`FlowContext`] that its layers share.
///
pub struct FlowRunner<F: DicomFlow> {
  flow: F,
  context: FlowContext,
  ended: bool,
}

impl<F: DicomFlow> FlowRunner<F> {
  pub fn new(flow: F) -> Self {
    Self {
      flow,
      context: FlowContext::default(),
      ended: false,
    }
  }

  /// Passes a part to the flow.
  ///
  pub fn add_part(
    &mut self,
    part: &DicomPart,
  ) -> Result<Vec<F::Out>, StreamError> {
    self.flow.handle_part(part, &mut self.context)
  }

  /// Ends the flow. Only the first call has an effect.
  ///
  pub fn end(&mut self) -> Result<Vec<F::Out>, StreamError> {
    if self.ended {
      return Ok(vec![]);
    }

    self.ended = true;
    self.flow.end(&mut self.context)
  }

  pub fn context(&self) -> &FlowContext {
    &self.context
  }

  pub fn flow(&self) -> &F {
    &self.flow
  }

  pub fn into_flow(self) -> F {
    self.flow
  }
}

/// The layers required by [`TagPathTracking`], around a consumer.
///
pub type TagPathStack<F> = InFragments<
  GuaranteedDelimitationEvents<GuaranteedValueEvent<TagPathTracking<F>>>,
>;

/// Stacks the layers [`TagPathTracking`] needs around a consumer.
///
pub fn tag_path_stack<F: DicomFlow>(consumer: F) -> TagPathStack<F> {
  InFragments::new(GuaranteedDelimitationEvents::new(
    GuaranteedValueEvent::new(TagPathTracking::new(consumer)),
  ))
}

/// Every capability layer, around a consumer.
///
pub type FullStack<F> = InFragments<
  GroupLengthWarnings<
    StartEvent<
      EndEvent<
        GuaranteedDelimitationEvents<
          GuaranteedValueEvent<InSequence<TagPathTracking<F>>>,
        >,
      >,
    >,
  >,
>;

/// Stacks every capability layer around a consumer, in an order that
/// satisfies all of their dependencies.
///
pub fn full_stack<F: DicomFlow>(consumer: F) -> FullStack<F> {
  InFragments::new(GroupLengthWarnings::new(StartEvent::new(EndEvent::new(
    GuaranteedDelimitationEvents::new(GuaranteedValueEvent::new(
      InSequence::new(TagPathTracking::new(consumer)),
    )),
  ))))
}
