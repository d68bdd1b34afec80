/// Renders the start of a byte slice in hexadecimal, e.g. `[1A 2B 3C 4D]`.
/// Slices longer than `max_length` are cut short and given a trailing
/// ellipsis along with their total length, e.g. `[1A 2B ... (9 bytes)]`.
///
pub fn hex_preview(bytes: &[u8], max_length: usize) -> String {
  let shown = bytes.len().min(max_length);

  let s = bytes[..shown]
    .iter()
    .map(|byte| format!("{:02X}", byte))
    .collect::<Vec<_>>()
    .join(" ");

  if shown == bytes.len() {
    format!("[{}]", s)
  } else {
    format!("[{} ... ({} bytes)]", s, bytes.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hex_preview_test() {
    assert_eq!(hex_preview(&[0xD1, 0x96, 0x33], 100), "[D1 96 33]");
    assert_eq!(hex_preview(&[], 4), "[]");

    assert_eq!(
      hex_preview(&[0xD1, 0x96, 0x33, 0x44], 2),
      "[D1 96 ... (4 bytes)]"
    );
  }
}
