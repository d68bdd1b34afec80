//! Converts incoming chunks of binary DICOM data into [`DicomPart`]s.
//!
//! Parsing is incremental: bytes are added to a [`ParseContext`] as they
//! arrive, and parts are read out as soon as enough bytes are available for
//! them. The parts produced don't depend on how the input is divided into
//! chunks.
//!
//! The encoding of the input is detected from its first data element header,
//! and is then updated from the transfer syntax given in the File Meta
//! Information, if present. Deflated data sets are inflated automatically
//! unless [`ParseConfig::inflate`] is turned off.

use std::rc::Rc;

use dcmflow_core::{
  dictionary, transfer_syntax, utils, DataElementTag, TransferSyntax,
  ValueRepresentation,
};

use crate::dicom_part::{
  DeflatedChunkPart, FragmentsPart, HeaderPart, ItemDelimitationPart,
  ItemPart, PreamblePart, SequenceDelimitationPart, SequencePart,
  UnknownPart, ValueChunkPart,
};
use crate::internal::byte_cursor::{ByteCursor, CursorError};
use crate::internal::data_element_header::{
  peek_header, read_tag, read_u16, read_u32, DataElementHeader,
};
use crate::internal::value_length::ValueLength;
use crate::{DicomPart, ParseConfig, StreamError};

/// A parse context holds the state of an in-progress parse. Raw bytes are
/// added with [`Self::write_bytes`] and parts are read out with
/// [`Self::read_parts`].
///
#[derive(Debug)]
pub struct ParseContext {
  config: ParseConfig,
  cursor: ByteCursor,
  state: ParserState,
  scopes: Vec<Scope>,
  finished: bool,
  failure: Option<StreamError>,
}

/// What the parser expects to read next.
///
#[derive(Clone, Debug, PartialEq)]
enum ParserState {
  AtBeginning,
  InFileMetaHeader {
    big_endian: bool,
    explicit_vr: bool,
    fmi_end: Option<u64>,
    transfer_syntax_uid: Option<String>,
  },
  InDatasetHeader {
    big_endian: bool,
    explicit_vr: bool,
    pending_inflate: bool,
  },
  InValue {
    bytes_left: u32,
    big_endian: bool,
    next: Box<ParserState>,
  },
  InFragments {
    fragment_index: u32,
    big_endian: bool,
    explicit_vr: bool,
  },
  InDeflatedData {
    big_endian: bool,
    nowrap: Option<bool>,
  },
}

/// An open sequence or item in the data set. Determinate-length scopes record
/// the offset at which they end.
///
#[derive(Clone, Copy, Debug, PartialEq)]
enum Scope {
  Sequence {
    ends_at: Option<u64>,
    item_count: u32,
    forced_implicit: bool,
  },
  Item {
    ends_at: Option<u64>,
    index: u32,
  },
}

impl Scope {
  fn ends_at(&self) -> Option<u64> {
    match self {
      Scope::Sequence { ends_at, .. } | Scope::Item { ends_at, .. } => *ends_at,
    }
  }
}

type Step = (Option<DicomPart>, ParserState);

const PREAMBLE_LENGTH: usize = 132;

const MAX_TRANSFER_SYNTAX_UID_LENGTH: u32 = 128;

impl ParseContext {
  /// Creates a new parse context. The default [`ParseConfig`] is used when no
  /// config is given.
  ///
  pub fn new(config: Option<ParseConfig>) -> Self {
    let config = config.unwrap_or_default();

    Self {
      config,
      cursor: ByteCursor::new(config.buffer_size_hint),
      state: ParserState::AtBeginning,
      scopes: vec![],
      finished: false,
      failure: None,
    }
  }

  pub fn config(&self) -> &ParseConfig {
    &self.config
  }

  /// Returns whether the whole input has been parsed.
  ///
  pub fn is_finished(&self) -> bool {
    self.finished
  }

  /// Returns the number of bytes consumed by the parts read so far. Once a
  /// deflated data set is being inflated this counts inflated bytes.
  ///
  pub fn bytes_read(&self) -> u64 {
    self.cursor.bytes_read()
  }

  /// Adds bytes to be parsed by subsequent calls to [`Self::read_parts`]. If
  /// `done` is true this marks the end of the input, after which further
  /// writes are an error.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: Vec<u8>,
    done: bool,
  ) -> Result<(), StreamError> {
    self.cursor.write(bytes, done).map_err(|e| {
      StreamError::from_cursor_error(
        e,
        "Writing data to parse context",
        self.cursor.bytes_read(),
      )
    })
  }

  /// Reads as many parts as the bytes written so far allow.
  ///
  /// When no parts can be read because more bytes are needed this returns
  /// [`StreamError::DataRequired`]. Once the input has been fully parsed an
  /// empty list is returned. A fatal error ends the parse, and every later
  /// call returns the same error.
  ///
  pub fn read_parts(&mut self) -> Result<Vec<DicomPart>, StreamError> {
    if let Some(failure) = &self.failure {
      return Err(failure.clone());
    }

    let mut parts = vec![];

    while !self.finished {
      let state = self.state.clone();

      match self.step(state) {
        Ok((part, next_state)) => {
          self.state = next_state;
          parts.extend(part);
        }

        Err(e) if e.is_data_required() => {
          if parts.is_empty() {
            return Err(e);
          }

          break;
        }

        Err(e) => {
          self.failure = Some(e.clone());

          if parts.is_empty() {
            return Err(e);
          }

          break;
        }
      }
    }

    Ok(parts)
  }

  fn step(&mut self, state: ParserState) -> Result<Step, StreamError> {
    match state {
      ParserState::AtBeginning => self.read_beginning(),

      ParserState::InFileMetaHeader {
        big_endian,
        explicit_vr,
        fmi_end,
        transfer_syntax_uid,
      } => self.read_file_meta_header(
        big_endian,
        explicit_vr,
        fmi_end,
        transfer_syntax_uid,
      ),

      ParserState::InDatasetHeader {
        big_endian,
        explicit_vr,
        pending_inflate,
      } => {
        if pending_inflate {
          self.start_inflate(big_endian, explicit_vr)
        } else {
          self.read_dataset_header(big_endian, explicit_vr)
        }
      }

      ParserState::InValue {
        bytes_left,
        big_endian,
        next,
      } => self.read_value_chunk(bytes_left, big_endian, next),

      ParserState::InFragments {
        fragment_index,
        big_endian,
        explicit_vr,
      } => self.read_fragment(fragment_index, big_endian, explicit_vr),

      ParserState::InDeflatedData { big_endian, nowrap } => {
        self.read_deflated_chunk(big_endian, nowrap)
      }
    }
  }

  /// Reads the optional preamble, then detects the encoding of the first data
  /// element header.
  ///
  fn read_beginning(&mut self) -> Result<Step, StreamError> {
    let when = "Reading file preamble";

    let has_preamble = match self.cursor.ensure(PREAMBLE_LENGTH) {
      Ok(()) => &self.cursor.remaining_data()[128..132] == b"DICM",
      Err(CursorError::DataEnd) => false,
      Err(e) => return Err(self.map_cursor_error(e, when)),
    };

    let header_offset = if has_preamble { PREAMBLE_LENGTH } else { 0 };

    match self.cursor.ensure(header_offset + 8) {
      Ok(()) => (),

      // A preamble with nothing after it is valid, as is empty input
      Err(CursorError::DataEnd)
        if self.cursor.remaining_size() == header_offset =>
      {
        let part = if has_preamble {
          Some(self.take_preamble()?)
        } else {
          None
        };

        return Ok((part, dataset_state(false, true)));
      }

      Err(e) => return Err(self.map_cursor_error(e, when)),
    }

    let data = &self.cursor.remaining_data()[header_offset..header_offset + 8];
    let (big_endian, explicit_vr, tag) = sniff_encoding(data)?;

    tracing::debug!(
      "Detected {} VR {} endian data starting with {}",
      if explicit_vr { "explicit" } else { "implicit" },
      if big_endian { "big" } else { "little" },
      tag
    );

    let next_state = if tag.is_file_meta_information() {
      ParserState::InFileMetaHeader {
        big_endian,
        explicit_vr,
        fmi_end: None,
        transfer_syntax_uid: None,
      }
    } else {
      dataset_state(big_endian, explicit_vr)
    };

    let part = if has_preamble {
      Some(self.take_preamble()?)
    } else {
      None
    };

    Ok((part, next_state))
  }

  fn take_preamble(&mut self) -> Result<DicomPart, StreamError> {
    let bytes = self.take(PREAMBLE_LENGTH, "Reading file preamble")?;

    Ok(DicomPart::Preamble(PreamblePart { bytes }))
  }

  /// Reads the next File Meta Information data element header, or moves on to
  /// the data set once the end of the File Meta Information is reached.
  ///
  fn read_file_meta_header(
    &mut self,
    big_endian: bool,
    explicit_vr: bool,
    mut fmi_end: Option<u64>,
    mut transfer_syntax_uid: Option<String>,
  ) -> Result<Step, StreamError> {
    let when = "Reading File Meta Information";

    if let Some(end) = fmi_end {
      if self.cursor.bytes_read() >= end {
        return Ok((None, self.dataset_state_for(transfer_syntax_uid)));
      }
    }

    match self.cursor.ensure(8) {
      Ok(()) => (),

      Err(CursorError::DataEnd) if self.cursor.remaining_size() == 0 => {
        self.finished = true;
        return Ok((None, ParserState::AtBeginning));
      }

      Err(e) => return Err(self.map_cursor_error(e, when)),
    }

    let header = peek_header(&mut self.cursor, big_endian, explicit_vr)
      .map_err(|e| self.map_cursor_error(e, when))?;

    if header.tag.group != 0x0002 {
      match fmi_end {
        None => tracing::warn!(
          "File Meta Information has no group length, it ended at {}",
          header.tag
        ),
        Some(end) => tracing::warn!(
          "File Meta Information ended at {} before its group length \
           indicated, which was at offset {}",
          header.tag,
          end
        ),
      }

      return Ok((None, self.dataset_state_for(transfer_syntax_uid)));
    }

    let vr = match header.vr {
      Some(vr) if vr != ValueRepresentation::Sequence => vr,
      _ => {
        return Err(StreamError::DataInvalid {
          when: when.to_string(),
          details: format!("Invalid File Meta Information element {}", header),
          offset: Some(self.cursor.bytes_read()),
        })
      }
    };

    if header.length == crate::dicom_part::INDETERMINATE_LENGTH {
      return Err(StreamError::DataInvalid {
        when: when.to_string(),
        details: format!("{} has an indeterminate length", header),
        offset: Some(self.cursor.bytes_read()),
      });
    }

    // Only the values that are needed are peeked, and only when they have a
    // bounded length
    if header.tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag {
      if header.length == 4 {
        let value_end = header.header_length + 4;
        let value = self.peek(value_end, when)?;

        fmi_end = Some(
          self.cursor.bytes_read()
            + value_end as u64
            + read_u32(&value[header.header_length..], big_endian) as u64,
        );
      } else {
        tracing::warn!(
          "File Meta Information group length is malformed, its value has {} \
           bytes",
          header.length
        );
      }
    }

    if header.tag == dictionary::TRANSFER_SYNTAX_UID.tag {
      if header.length < MAX_TRANSFER_SYNTAX_UID_LENGTH {
        let value_end = header.header_length + header.length as usize;
        let value =
          self.peek(value_end, when)?.split_off(header.header_length);

        let uid = String::from_utf8_lossy(&value)
          .trim_end_matches(['\0', ' '])
          .to_string();

        transfer_syntax_uid = Some(uid);
      } else {
        tracing::warn!(
          "Transfer syntax UID of {} bytes is too long and was skipped",
          header.length
        );
      }
    }

    warn_if_odd_length(&header);

    let bytes = self.take(header.header_length, when)?;

    let part = DicomPart::Header(HeaderPart {
      tag: header.tag,
      vr,
      length: header.length,
      is_fmi: true,
      big_endian,
      explicit_vr,
      bytes,
    });

    let next_state = ParserState::InFileMetaHeader {
      big_endian,
      explicit_vr,
      fmi_end,
      transfer_syntax_uid,
    };

    Ok((Some(part), value_state(header.length, big_endian, next_state)))
  }

  /// Returns the state for the data set that follows the File Meta
  /// Information, based on its transfer syntax.
  ///
  fn dataset_state_for(
    &self,
    transfer_syntax_uid: Option<String>,
  ) -> ParserState {
    let transfer_syntax = match transfer_syntax_uid {
      None => {
        tracing::warn!(
          "File Meta Information has no transfer syntax UID, assuming \
           explicit VR little endian"
        );

        &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN
      }

      Some(uid) => match TransferSyntax::from_uid(&uid) {
        Ok(transfer_syntax) => transfer_syntax,
        Err(()) => {
          tracing::warn!(
            "Transfer syntax UID '{}' is not recognized, assuming explicit \
             VR little endian",
            uid
          );

          &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN
        }
      },
    };

    tracing::debug!("Data set uses transfer syntax {}", transfer_syntax.name);

    let big_endian = transfer_syntax.is_big_endian();
    let explicit_vr = transfer_syntax.is_explicit_vr();

    if !transfer_syntax.is_deflated {
      return dataset_state(big_endian, explicit_vr);
    }

    if self.config.inflate {
      ParserState::InDatasetHeader {
        big_endian,
        explicit_vr,
        pending_inflate: true,
      }
    } else {
      ParserState::InDeflatedData {
        big_endian,
        nowrap: None,
      }
    }
  }

  /// Routes the rest of the input through inflate, checking first for a zlib
  /// header that some encoders incorrectly add.
  ///
  fn start_inflate(
    &mut self,
    big_endian: bool,
    explicit_vr: bool,
  ) -> Result<Step, StreamError> {
    let zlib_header = self.detect_zlib_header("Starting inflate")?;
    if zlib_header {
      tracing::warn!("Deflated data set has a zlib header");
    }

    self.cursor.start_inflate(zlib_header);

    Ok((None, dataset_state(big_endian, explicit_vr)))
  }

  fn detect_zlib_header(&mut self, when: &str) -> Result<bool, StreamError> {
    match self.cursor.peek(2) {
      Ok(data) => Ok(has_zlib_header(data)),
      Err(CursorError::DataEnd) => Ok(false),
      Err(e) => Err(self.map_cursor_error(e, when)),
    }
  }

  /// Reads the next data set element header, or item or delimitation, and
  /// classifies it into a part.
  ///
  fn read_dataset_header(
    &mut self,
    big_endian: bool,
    explicit_vr: bool,
  ) -> Result<Step, StreamError> {
    let when = "Reading data element header";
    let current_state = dataset_state(big_endian, explicit_vr);

    self.close_ended_scopes();

    match self.cursor.ensure(8) {
      Ok(()) => (),

      Err(CursorError::DataEnd) if self.cursor.remaining_size() == 0 => {
        if self.cursor.is_inflate_incomplete() {
          return Err(StreamError::DataEndedUnexpectedly {
            when: "Inflating data set".to_string(),
            offset: self.cursor.bytes_read(),
          });
        }

        self.finished = true;
        return Ok((None, current_state));
      }

      Err(e) => return Err(self.map_cursor_error(e, when)),
    }

    // Sequences of UN with an indeterminate length hold implicit VR little
    // endian data (CP-246)
    let (big_endian, explicit_vr) = if self.in_forced_implicit_scope() {
      (false, false)
    } else {
      (big_endian, explicit_vr)
    };

    let header = peek_header(&mut self.cursor, big_endian, explicit_vr)
      .map_err(|e| self.map_cursor_error(e, when))?;

    if header.tag.group == 0xFFFE {
      return match self.read_control_element(&header, big_endian)? {
        Some(part) => Ok((Some(part), current_state)),
        None => self.read_unknown(&header, big_endian, when, current_state),
      };
    }

    let vr = match header.vr {
      Some(vr) => vr,
      None => {
        return self.read_unknown(&header, big_endian, when, current_state)
      }
    };

    let value_length = ValueLength::new(header.length);

    if vr == ValueRepresentation::Sequence
      || (vr == ValueRepresentation::Unknown
        && value_length == ValueLength::Indeterminate)
    {
      let bytes = self.take(header.header_length, when)?;

      self.scopes.push(Scope::Sequence {
        ends_at: self.scope_end(value_length),
        item_count: 0,
        forced_implicit: vr == ValueRepresentation::Unknown,
      });

      let part = DicomPart::Sequence(SequencePart {
        tag: header.tag,
        length: header.length,
        big_endian,
        explicit_vr,
        bytes,
      });

      return Ok((Some(part), current_state));
    }

    if value_length == ValueLength::Indeterminate {
      let bytes = self.take(header.header_length, when)?;

      let part = DicomPart::Fragments(FragmentsPart {
        tag: header.tag,
        vr,
        length: header.length,
        big_endian,
        explicit_vr,
        bytes,
      });

      let next_state = ParserState::InFragments {
        fragment_index: 0,
        big_endian,
        explicit_vr,
      };

      return Ok((Some(part), next_state));
    }

    warn_if_odd_length(&header);

    let bytes = self.take(header.header_length, when)?;

    let part = DicomPart::Header(HeaderPart {
      tag: header.tag,
      vr,
      length: header.length,
      is_fmi: false,
      big_endian,
      explicit_vr,
      bytes,
    });

    Ok((Some(part), value_state(header.length, big_endian, current_state)))
  }

  /// Reads an item, item delimitation or sequence delimitation, keeping the
  /// scope stack up to date. Returns `None` for any other element in group
  /// `0xFFFE`.
  ///
  fn read_control_element(
    &mut self,
    header: &DataElementHeader,
    big_endian: bool,
  ) -> Result<Option<DicomPart>, StreamError> {
    let when = "Reading item or delimitation";

    match header.tag {
      tag if tag == dictionary::ITEM.tag => {
        let bytes = self.take(8, when)?;

        let index = match self.scopes.last_mut() {
          Some(Scope::Sequence { item_count, .. }) => {
            *item_count += 1;
            *item_count
          }

          _ => {
            tracing::warn!("Item found outside of a sequence");
            1
          }
        };

        let ends_at = self.scope_end(ValueLength::new(header.length));
        self.scopes.push(Scope::Item { ends_at, index });

        Ok(Some(DicomPart::Item(ItemPart {
          index,
          length: header.length,
          big_endian,
          bytes,
        })))
      }

      tag if tag == dictionary::ITEM_DELIMITATION_ITEM.tag => {
        let bytes = self.take(8, when)?;

        let index = match self.scopes.last() {
          Some(Scope::Item { index, .. }) => {
            let index = *index;
            self.scopes.pop();
            index
          }

          _ => {
            tracing::warn!("Item delimitation found outside of an item");
            0
          }
        };

        Ok(Some(DicomPart::ItemDelimitation(ItemDelimitationPart {
          index,
          big_endian,
          bytes,
          marker: false,
        })))
      }

      tag if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag => {
        let bytes = self.take(8, when)?;

        match self
          .scopes
          .iter()
          .rposition(|scope| matches!(scope, Scope::Sequence { .. }))
        {
          Some(i) => self.scopes.truncate(i),
          None => {
            tracing::warn!("Sequence delimitation found outside of a sequence")
          }
        }

        Ok(Some(DicomPart::SequenceDelimitation(SequenceDelimitationPart {
          big_endian,
          bytes,
          marker: false,
        })))
      }

      _ => Ok(None),
    }
  }

  /// Reads the header of an element that can't be interpreted. Its value
  /// follows as value chunks, after which parsing continues with
  /// `next_state`.
  ///
  /// The end of an unrecognized element with an indeterminate length can't be
  /// found, so it is a fatal error.
  ///
  fn read_unknown(
    &mut self,
    header: &DataElementHeader,
    big_endian: bool,
    when: &str,
    next_state: ParserState,
  ) -> Result<Step, StreamError> {
    if header.length == crate::dicom_part::INDETERMINATE_LENGTH {
      return Err(StreamError::DataInvalid {
        when: when.to_string(),
        details: format!(
          "Unrecognized element {} has an indeterminate length",
          header.tag
        ),
        offset: Some(self.cursor.bytes_read()),
      });
    }

    let bytes = self.take(header.header_length, when)?;

    let part = DicomPart::Unknown(UnknownPart {
      tag: header.tag,
      length: header.length,
      big_endian,
      bytes,
    });

    Ok((Some(part), value_state(header.length, big_endian, next_state)))
  }

  fn read_value_chunk(
    &mut self,
    bytes_left: u32,
    big_endian: bool,
    next: Box<ParserState>,
  ) -> Result<Step, StreamError> {
    let chunk_size = (bytes_left as usize).min(self.config.chunk_size);
    let bytes = self.take(chunk_size, "Reading data element value")?;

    let bytes_left = bytes_left - chunk_size as u32;

    let part = DicomPart::ValueChunk(ValueChunkPart {
      big_endian,
      bytes,
      last: bytes_left == 0,
      marker: false,
    });

    let next_state = if bytes_left == 0 {
      *next
    } else {
      ParserState::InValue {
        bytes_left,
        big_endian,
        next,
      }
    };

    Ok((Some(part), next_state))
  }

  /// Reads the next fragment item of encapsulated pixel data, or the
  /// delimitation that ends the fragments.
  ///
  fn read_fragment(
    &mut self,
    fragment_index: u32,
    big_endian: bool,
    explicit_vr: bool,
  ) -> Result<Step, StreamError> {
    let when = "Reading fragment";

    let next_state = ParserState::InFragments {
      fragment_index,
      big_endian,
      explicit_vr,
    };

    // Fragments of encapsulated pixel data inside a sequence of UN are still
    // implicit VR little endian
    let (big_endian, explicit_vr) = if self.in_forced_implicit_scope() {
      (false, false)
    } else {
      (big_endian, explicit_vr)
    };

    let data = self.peek(8, when)?;
    let tag = read_tag(&data, big_endian);
    let length = read_u32(&data[4..8], big_endian);

    if tag == dictionary::ITEM.tag {
      if length == crate::dicom_part::INDETERMINATE_LENGTH {
        return Err(StreamError::DataInvalid {
          when: when.to_string(),
          details: "Fragment has an indeterminate length".to_string(),
          offset: Some(self.cursor.bytes_read()),
        });
      }

      let bytes = self.take(8, when)?;
      let index = fragment_index + 1;

      let part = DicomPart::Item(ItemPart {
        index,
        length,
        big_endian,
        bytes,
      });

      let next_state = match next_state {
        ParserState::InFragments {
          big_endian,
          explicit_vr,
          ..
        } => ParserState::InFragments {
          fragment_index: index,
          big_endian,
          explicit_vr,
        },
        state => state,
      };

      return Ok((Some(part), value_state(length, big_endian, next_state)));
    }

    if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag {
      let bytes = self.take(8, when)?;

      let part = DicomPart::SequenceDelimitation(SequenceDelimitationPart {
        big_endian,
        bytes,
        marker: false,
      });

      let next_state = match next_state {
        ParserState::InFragments {
          big_endian,
          explicit_vr,
          ..
        } => dataset_state(big_endian, explicit_vr),
        state => state,
      };

      return Ok((Some(part), next_state));
    }

    tracing::warn!("Unexpected element {} found in fragments", tag);

    let header = peek_header(&mut self.cursor, big_endian, explicit_vr)
      .map_err(|e| self.map_cursor_error(e, when))?;

    self.read_unknown(&header, big_endian, when, next_state)
  }

  /// Emits the deflated data set as chunks without inflating it.
  ///
  fn read_deflated_chunk(
    &mut self,
    big_endian: bool,
    nowrap: Option<bool>,
  ) -> Result<Step, StreamError> {
    let when = "Reading deflated data";

    let nowrap = match nowrap {
      Some(nowrap) => nowrap,
      None => {
        let nowrap = !self.detect_zlib_header(when)?;
        return Ok((None, ParserState::InDeflatedData {
          big_endian,
          nowrap: Some(nowrap),
        }));
      }
    };

    let chunk_size = match self.cursor.ensure(self.config.chunk_size) {
      Ok(()) => self.config.chunk_size,
      Err(CursorError::DataEnd) => self.cursor.remaining_size(),
      Err(e) => return Err(self.map_cursor_error(e, when)),
    };

    let next_state = ParserState::InDeflatedData {
      big_endian,
      nowrap: Some(nowrap),
    };

    if chunk_size == 0 {
      self.finished = true;
      return Ok((None, next_state));
    }

    let bytes = self.take(chunk_size, when)?;

    let part = DicomPart::DeflatedChunk(DeflatedChunkPart {
      big_endian,
      bytes,
      nowrap,
    });

    Ok((Some(part), next_state))
  }

  /// Removes determinate-length sequences and items that have ended.
  ///
  fn close_ended_scopes(&mut self) {
    let bytes_read = self.cursor.bytes_read();

    while let Some(scope) = self.scopes.last() {
      match scope.ends_at() {
        Some(ends_at) if ends_at <= bytes_read => {
          self.scopes.pop();
        }
        _ => break,
      }
    }
  }

  fn in_forced_implicit_scope(&self) -> bool {
    self.scopes.iter().any(|scope| {
      matches!(
        scope,
        Scope::Sequence {
          forced_implicit: true,
          ..
        }
      )
    })
  }

  fn scope_end(&self, value_length: ValueLength) -> Option<u64> {
    match value_length {
      ValueLength::Defined { length } => {
        Some(self.cursor.bytes_read() + length as u64)
      }
      ValueLength::Indeterminate => None,
    }
  }

  fn peek(&mut self, n: usize, when: &str) -> Result<Vec<u8>, StreamError> {
    let offset = self.cursor.bytes_read();

    self
      .cursor
      .peek(n)
      .map(|data| data.to_vec())
      .map_err(|e| StreamError::from_cursor_error(e, when, offset))
  }

  fn take(&mut self, n: usize, when: &str) -> Result<Rc<Vec<u8>>, StreamError> {
    match self.cursor.take(n) {
      Ok(bytes) => Ok(Rc::new(bytes)),
      Err(e) => Err(self.map_cursor_error(e, when)),
    }
  }

  fn map_cursor_error(&self, error: CursorError, when: &str) -> StreamError {
    StreamError::from_cursor_error(error, when, self.cursor.bytes_read())
  }
}

fn dataset_state(big_endian: bool, explicit_vr: bool) -> ParserState {
  ParserState::InDatasetHeader {
    big_endian,
    explicit_vr,
    pending_inflate: false,
  }
}

/// Returns the state that reads a value of the given length before moving on
/// to `next`. Zero-length values have no value chunks.
///
fn value_state(length: u32, big_endian: bool, next: ParserState) -> ParserState {
  if length == 0 {
    next
  } else {
    ParserState::InValue {
      bytes_left: length,
      big_endian,
      next: Box::new(next),
    }
  }
}

fn warn_if_odd_length(header: &DataElementHeader) {
  if header.length % 2 == 1 {
    tracing::warn!(
      "Data element {} has an odd length of {} bytes",
      header,
      header.length
    );
  }
}

/// Detects the byte order and VR encoding of the input from its first data
/// element header. Little endian is tried first.
///
fn sniff_encoding(
  data: &[u8],
) -> Result<(bool, bool, DataElementTag), StreamError> {
  if let Some(explicit_vr) = sniff_header(data, false) {
    return Ok((false, explicit_vr, read_tag(data, false)));
  }

  match sniff_header(data, true) {
    Some(true) => Ok((true, true, read_tag(data, true))),
    Some(false) => Err(StreamError::ImplicitVrBigEndian),
    None => Err(StreamError::NotDicom {
      details: format!(
        "Data starts with {}, which is not a data element header",
        utils::hex_preview(data, 8)
      ),
    }),
  }
}

/// Checks whether the given bytes are a plausible data element header in the
/// given byte order. On success returns whether the header has an explicit
/// VR.
///
fn sniff_header(data: &[u8], big_endian: bool) -> Option<bool> {
  let tag = read_tag(data, big_endian);

  if dictionary::vr_of(tag) == ValueRepresentation::Unknown {
    return None;
  }

  Some(ValueRepresentation::from_bytes(&data[4..6]).is_ok())
}

/// Returns whether deflated data starts with a zlib header rather than raw
/// deflate data.
///
fn has_zlib_header(data: &[u8]) -> bool {
  let header = read_u16(data, true);

  data[0] & 0x0F == 8 && data[0] >> 4 <= 7 && header % 31 == 0
}
