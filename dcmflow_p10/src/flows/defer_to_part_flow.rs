use std::marker::PhantomData;

use crate::{DicomPart, StreamError};

use super::{DicomFlow, FlowContext, FlowOutput};

/// A consumer that hands every part to a callback, along with the current
/// flow context. This is the simplest way to consume parts with a closure.
///
/// ```
/// use dcmflow_p10::flows::{tag_path_stack, DeferToPartFlow};
/// use dcmflow_p10::DicomPart;
///
/// let flow = tag_path_stack(DeferToPartFlow::new(|part: &DicomPart, _| {
///   Ok(vec![part.to_string()])
/// }));
/// ```
///
pub struct DeferToPartFlow<O, F> {
  callback: F,
  output: PhantomData<fn() -> O>,
}

impl<O, F> DeferToPartFlow<O, F>
where
  O: FlowOutput,
  F: FnMut(&DicomPart, &FlowContext) -> Result<Vec<O>, StreamError>,
{
  pub fn new(callback: F) -> Self {
    Self {
      callback,
      output: PhantomData,
    }
  }
}

impl<O, F> DicomFlow for DeferToPartFlow<O, F>
where
  O: FlowOutput,
  F: FnMut(&DicomPart, &FlowContext) -> Result<Vec<O>, StreamError>,
{
  type Out = O;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    context: &mut FlowContext,
  ) -> Result<Vec<O>, StreamError> {
    (self.callback)(part, context)
  }
}
