//! dcmflow parses DICOM data as a stream of parts, and consumes those parts
//! with flows built from composable capability layers.

/// Provides core DICOM concepts including data element tags, value
/// representations, transfer syntaxes, a dictionary of common data elements,
/// and the tag paths and tag trees used to address data elements.
///
pub mod core {
  pub use dcmflow_core::*;
}

/// Parses DICOM data into parts, and runs parts through flows.
///
pub mod p10 {
  pub use dcmflow_p10::*;
}

mod integration_tests;
