use crate::{DicomPart, StreamError};

use super::{DicomFlow, FlowContext};

/// A consumer that outputs every part it receives, unchanged.
///
#[derive(Clone, Debug, Default)]
pub struct IdentityFlow;

impl IdentityFlow {
  pub fn new() -> Self {
    Self
  }
}

impl DicomFlow for IdentityFlow {
  type Out = DicomPart;

  fn handle_part(
    &mut self,
    part: &DicomPart,
    _context: &mut FlowContext,
  ) -> Result<Vec<DicomPart>, StreamError> {
    Ok(vec![part.clone()])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::dicom_part::MetaPart;

  #[test]
  fn echoes_parts_test() {
    let mut flow = IdentityFlow::new();
    let mut context = FlowContext::default();

    let part = DicomPart::Meta(MetaPart::DicomStart);

    assert_eq!(flow.handle_part(&part, &mut context), Ok(vec![part]));
    assert_eq!(flow.end(&mut context), Ok(vec![]));
  }
}
