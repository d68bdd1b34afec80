use std::collections::VecDeque;

/// A cursor over incoming chunks of binary data of any size that allows the
/// data to be checked for, peeked and taken as if it were one contiguous run
/// of bytes.
///
/// Once [`Self::start_inflate`] has been called, all buffered and subsequently
/// written bytes are passed through streaming inflate before being made
/// available.
///
#[derive(Debug)]
pub struct ByteCursor {
  buffer: Vec<u8>,
  position: usize,
  bytes_read: u64,
  is_writing_finished: bool,
  inflater: Option<Inflater>,
}

#[derive(Debug)]
struct Inflater {
  decompress: flate2::Decompress,
  input_queue: VecDeque<QueueItem>,
  is_complete: bool,
}

#[derive(Debug)]
struct QueueItem {
  data: Vec<u8>,
  bytes_read: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CursorError {
  /// The requested number of bytes isn't available yet and more bytes need to
  /// be written before the request can be served.
  DataRequired,

  /// The requested number of bytes will never be available because the final
  /// bytes have been written.
  DataEnd,

  /// Bytes passed through inflate were not valid deflate data.
  InflateError,

  /// Bytes were written after the final bytes had already been written.
  WriteAfterCompletion,
}

/// Inflated data is produced in chunks of at most this size so that a small
/// amount of deflated input can't expand into an unbounded buffer.
///
const INFLATE_CHUNK_SIZE: usize = 64 * 1024;

/// Consumed bytes at the front of the buffer are dropped once there are at
/// least this many of them.
///
const COMPACT_THRESHOLD: usize = 16 * 1024;

impl ByteCursor {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: Vec::with_capacity(capacity),
      position: 0,
      bytes_read: 0,
      is_writing_finished: false,
      inflater: None,
    }
  }

  /// Returns the total number of bytes taken from the cursor. Once inflate is
  /// active this counts inflated bytes.
  ///
  pub fn bytes_read(&self) -> u64 {
    self.bytes_read
  }

  /// Returns whether inflate has been given deflated data but hasn't reached
  /// the end of the deflate stream.
  ///
  pub fn is_inflate_incomplete(&self) -> bool {
    match &self.inflater {
      Some(inflater) => {
        !inflater.is_complete
          && (inflater.decompress.total_in() > 0
            || !inflater.input_queue.is_empty())
      }
      None => false,
    }
  }

  /// Adds bytes to the end of the cursor. When `done` is true no further
  /// writes are permitted.
  ///
  pub fn write(
    &mut self,
    data: Vec<u8>,
    done: bool,
  ) -> Result<(), CursorError> {
    if self.is_writing_finished {
      return Err(CursorError::WriteAfterCompletion);
    }

    self.is_writing_finished = done;

    if data.is_empty() {
      return Ok(());
    }

    match self.inflater.as_mut() {
      Some(inflater) => inflater.input_queue.push_back(QueueItem {
        data,
        bytes_read: 0,
      }),

      None => self.buffer.extend_from_slice(&data),
    }

    Ok(())
  }

  /// Checks that at least `n` bytes are available to be peeked or taken.
  ///
  /// Returns [`CursorError::DataRequired`] when more bytes need to be written,
  /// and [`CursorError::DataEnd`] when fewer than `n` bytes remain and the
  /// final bytes have already been written.
  ///
  pub fn ensure(&mut self, n: usize) -> Result<(), CursorError> {
    self.inflate_up_to(n)?;

    if self.remaining_size() >= n {
      return Ok(());
    }

    if !self.is_writing_finished {
      Err(CursorError::DataRequired)
    } else {
      Err(CursorError::DataEnd)
    }
  }

  /// Returns the next `n` bytes without consuming them.
  ///
  pub fn peek(&mut self, n: usize) -> Result<&[u8], CursorError> {
    self.ensure(n)?;

    Ok(&self.buffer[self.position..self.position + n])
  }

  /// Consumes and returns the next `n` bytes.
  ///
  pub fn take(&mut self, n: usize) -> Result<Vec<u8>, CursorError> {
    self.ensure(n)?;

    let data = self.buffer[self.position..self.position + n].to_vec();
    self.position += n;
    self.bytes_read += n as u64;

    if self.position >= COMPACT_THRESHOLD
      && self.position * 2 >= self.buffer.len()
    {
      self.buffer.drain(..self.position);
      self.position = 0;
    }

    Ok(data)
  }

  /// Returns the number of buffered bytes that haven't been taken.
  ///
  pub fn remaining_size(&self) -> usize {
    self.buffer.len() - self.position
  }

  /// Returns the buffered bytes that haven't been taken.
  ///
  pub fn remaining_data(&self) -> &[u8] {
    &self.buffer[self.position..]
  }

  /// Replaces the buffered bytes that haven't been taken.
  ///
  pub fn set_input(&mut self, data: Vec<u8>) {
    self.buffer = data;
    self.position = 0;
  }

  /// Routes all buffered bytes, and all bytes written from now on, through
  /// streaming inflate. `zlib_header` selects between zlib-wrapped and raw
  /// deflate data.
  ///
  pub fn start_inflate(&mut self, zlib_header: bool) {
    let pending = self.remaining_data().to_vec();
    self.set_input(vec![]);

    let mut input_queue = VecDeque::new();
    if !pending.is_empty() {
      input_queue.push_back(QueueItem {
        data: pending,
        bytes_read: 0,
      });
    }

    self.inflater = Some(Inflater {
      decompress: flate2::Decompress::new(zlib_header),
      input_queue,
      is_complete: false,
    });
  }

  /// Inflates queued input until at least `n` bytes are buffered, the queued
  /// input runs out, or the deflate stream ends.
  ///
  fn inflate_up_to(&mut self, n: usize) -> Result<(), CursorError> {
    let inflater = match self.inflater.as_mut() {
      Some(inflater) => inflater,
      None => return Ok(()),
    };

    while self.buffer.len() - self.position < n && !inflater.is_complete {
      let mut item = match inflater.input_queue.pop_front() {
        Some(item) => item,
        None => break,
      };

      let total_in = inflater.decompress.total_in();
      let total_out = inflater.decompress.total_out();

      let mut output = vec![0u8; INFLATE_CHUNK_SIZE];
      let input = &item.data[item.bytes_read..];

      let status = inflater
        .decompress
        .decompress(input, &mut output, flate2::FlushDecompress::None)
        .map_err(|_| CursorError::InflateError)?;

      let consumed = (inflater.decompress.total_in() - total_in) as usize;
      let produced = (inflater.decompress.total_out() - total_out) as usize;

      self.buffer.extend_from_slice(&output[..produced]);

      if status == flate2::Status::StreamEnd {
        inflater.is_complete = true;
        inflater.input_queue.clear();
        break;
      }

      item.bytes_read += consumed;
      let item_exhausted = item.bytes_read == item.data.len();

      if !item_exhausted {
        // A stalled decompressor is given the next queued chunk as well
        if consumed == 0 && produced == 0 {
          match inflater.input_queue.pop_front() {
            Some(next) => {
              item.data.drain(..item.bytes_read);
              item.data.extend_from_slice(&next.data[next.bytes_read..]);
              item.bytes_read = 0;
            }

            None => {
              inflater.input_queue.push_front(item);
              break;
            }
          }
        }

        inflater.input_queue.push_front(item);
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::io::Write;

  fn deflate(data: &[u8], zlib_header: bool) -> Vec<u8> {
    if zlib_header {
      let mut encoder = flate2::write::ZlibEncoder::new(
        vec![],
        flate2::Compression::default(),
      );
      encoder.write_all(data).unwrap();
      encoder.finish().unwrap()
    } else {
      let mut encoder = flate2::write::DeflateEncoder::new(
        vec![],
        flate2::Compression::default(),
      );
      encoder.write_all(data).unwrap();
      encoder.finish().unwrap()
    }
  }

  #[test]
  fn ensure_take_and_peek_test() {
    let mut cursor = ByteCursor::new(16);

    assert_eq!(cursor.ensure(1), Err(CursorError::DataRequired));

    cursor.write(vec![1, 2, 3], false).unwrap();
    assert_eq!(cursor.peek(2), Ok([1u8, 2].as_slice()));
    assert_eq!(cursor.ensure(4), Err(CursorError::DataRequired));

    cursor.write(vec![4, 5], true).unwrap();
    assert_eq!(cursor.take(4), Ok(vec![1, 2, 3, 4]));
    assert_eq!(cursor.bytes_read(), 4);
    assert_eq!(cursor.remaining_data(), &[5]);
    assert_eq!(cursor.ensure(2), Err(CursorError::DataEnd));

    assert_eq!(cursor.take(1), Ok(vec![5]));
    assert_eq!(cursor.ensure(1), Err(CursorError::DataEnd));
  }

  #[test]
  fn write_after_completion_test() {
    let mut cursor = ByteCursor::new(0);

    cursor.write(vec![1], true).unwrap();
    assert_eq!(
      cursor.write(vec![2], false),
      Err(CursorError::WriteAfterCompletion)
    );
  }

  #[test]
  fn set_input_test() {
    let mut cursor = ByteCursor::new(0);
    cursor.write(vec![1, 2, 3], false).unwrap();
    cursor.take(1).unwrap();

    cursor.set_input(vec![9, 8]);
    assert_eq!(cursor.remaining_size(), 2);
    assert_eq!(cursor.take(2), Ok(vec![9, 8]));
    assert_eq!(cursor.bytes_read(), 3);
  }

  #[test]
  fn compacts_consumed_bytes_test() {
    let mut cursor = ByteCursor::new(0);
    cursor.write(vec![7; COMPACT_THRESHOLD * 2], false).unwrap();

    cursor.take(COMPACT_THRESHOLD).unwrap();
    assert_eq!(cursor.position, 0);
    assert_eq!(cursor.remaining_size(), COMPACT_THRESHOLD);
  }

  #[test]
  fn inflate_test() {
    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    for zlib_header in [false, true] {
      let deflated = deflate(&data, zlib_header);

      let mut cursor = ByteCursor::new(0);
      let mut input = vec![0xAA, 0xBB];
      input.extend_from_slice(&deflated[..10]);
      cursor.write(input, false).unwrap();

      assert_eq!(cursor.take(2), Ok(vec![0xAA, 0xBB]));
      cursor.start_inflate(zlib_header);

      // Feed the remaining deflated bytes in small pieces
      for piece in deflated[10..].chunks(7) {
        cursor.write(piece.to_vec(), false).unwrap();
      }
      cursor.write(vec![], true).unwrap();

      assert_eq!(cursor.take(data.len()), Ok(data.clone()));
      assert_eq!(cursor.ensure(1), Err(CursorError::DataEnd));
      assert!(!cursor.is_inflate_incomplete());
    }
  }

  #[test]
  fn inflate_error_test() {
    let mut cursor = ByteCursor::new(0);
    cursor.start_inflate(true);
    cursor.write(vec![0xFF; 32], true).unwrap();

    assert_eq!(cursor.ensure(1), Err(CursorError::InflateError));
  }

  #[test]
  fn truncated_deflate_data_test() {
    let deflated = deflate(&[5; 1000], false);

    let mut cursor = ByteCursor::new(0);
    cursor.start_inflate(false);
    cursor
      .write(deflated[..deflated.len() / 2].to_vec(), true)
      .unwrap();

    assert_eq!(cursor.ensure(1000), Err(CursorError::DataEnd));
    assert!(cursor.is_inflate_incomplete());
  }

  #[test]
  fn inflate_without_input_is_not_incomplete_test() {
    let mut cursor = ByteCursor::new(0);
    assert!(!cursor.is_inflate_incomplete());

    cursor.start_inflate(false);
    cursor.write(vec![], true).unwrap();

    assert_eq!(cursor.ensure(1), Err(CursorError::DataEnd));
    assert!(!cursor.is_inflate_incomplete());
  }
}
