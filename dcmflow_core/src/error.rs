use owo_colors::{OwoColorize, Stream::Stderr};

/// Shared trait implemented by the error types of the dcmflow crates.
///
pub trait DcmflowError {
  /// Returns lines of text that describe an error in a human-readable format.
  /// The task description names what was being attempted when the error
  /// occurred, e.g. "Reading 'input.dcm'".
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String>;

  /// Prints details on the error to stderr, in red when the terminal supports
  /// color.
  ///
  fn print(&self, task_description: &str) {
    eprintln!();
    eprintln!("{}", "-----".if_supports_color(Stderr, |text| text.red()));

    for line in self.to_lines(task_description) {
      eprintln!("{}", line.if_supports_color(Stderr, |text| text.red()));
    }

    eprintln!();
  }
}
