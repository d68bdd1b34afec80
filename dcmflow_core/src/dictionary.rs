//! Data element lookups against the standard DICOM data dictionary, plus named
//! constants for the data elements that dcmflow refers to directly.
//!
//! Tags that are not in the standard dictionary resolve to a VR of UN, with
//! the exception of group length tags, which are always UL, and private
//! creator tags, which are always LO.

use dicom_core::dictionary::{DataDictionary, DataDictionaryEntry, VirtualVr};
use dicom_core::{Tag, VR};
use dicom_dictionary_std::StandardDataDictionary;

use crate::{DataElementTag, ValueRepresentation};

static DICTIONARY: StandardDataDictionary = StandardDataDictionary;

/// A data element that is referred to by name.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
  pub tag: DataElementTag,
  pub keyword: &'static str,
  pub vr: ValueRepresentation,
}

macro_rules! items {
  ($($id:ident: ($group:literal, $element:literal), $keyword:literal, $vr:ident;)*) => {
    $(
      pub const $id: Item = Item {
        tag: DataElementTag::new($group, $element),
        keyword: $keyword,
        vr: ValueRepresentation::$vr,
      };
    )*

    #[cfg(test)]
    static ALL: &[Item] = &[$($id),*];
  };
}

items! {
  FILE_META_INFORMATION_GROUP_LENGTH: (0x0002, 0x0000), "FileMetaInformationGroupLength", UnsignedLong;
  TRANSFER_SYNTAX_UID: (0x0002, 0x0010), "TransferSyntaxUID", UniqueIdentifier;
  STUDY_DATE: (0x0008, 0x0020), "StudyDate", Date;
  REFERENCED_SERIES_SEQUENCE: (0x0008, 0x1115), "ReferencedSeriesSequence", Sequence;
  REFERENCED_IMAGE_SEQUENCE: (0x0008, 0x1140), "ReferencedImageSequence", Sequence;
  PATIENT_NAME: (0x0010, 0x0010), "PatientName", PersonName;
  PATIENT_ID: (0x0010, 0x0020), "PatientID", LongString;
  PATIENT_SEX: (0x0010, 0x0040), "PatientSex", CodeString;
  PATIENT_AGE: (0x0010, 0x1010), "PatientAge", AgeString;
  SERIES_INSTANCE_UID: (0x0020, 0x000E), "SeriesInstanceUID", UniqueIdentifier;
  PIXEL_DATA: (0x7FE0, 0x0010), "PixelData", OtherWordString;
  ITEM: (0xFFFE, 0xE000), "Item", Unknown;
  ITEM_DELIMITATION_ITEM: (0xFFFE, 0xE00D), "ItemDelimitationItem", Unknown;
  SEQUENCE_DELIMITATION_ITEM: (0xFFFE, 0xE0DD), "SequenceDelimitationItem", Unknown;
}

fn entry_of(
  tag: DataElementTag,
) -> Option<&'static impl DataDictionaryEntry> {
  DICTIONARY.by_tag(Tag(tag.group, tag.element))
}

/// Converts a VR from the standard dictionary. Context-dependent VRs such as
/// `US or SS` and `OB or OW` resolve to their unsigned and word forms.
///
fn convert_vr(vr: VirtualVr) -> ValueRepresentation {
  let vr = match vr {
    VirtualVr::Exact(vr) => vr,
    VirtualVr::Xs => VR::US,
    _ => VR::OW,
  };

  ValueRepresentation::from_bytes(&vr.to_bytes())
    .unwrap_or(ValueRepresentation::Unknown)
}

/// Returns the VR of a tag. Unknown tags are given a VR of UN.
///
pub fn vr_of(tag: DataElementTag) -> ValueRepresentation {
  if tag.is_group_length() {
    return ValueRepresentation::UnsignedLong;
  }

  if tag.is_private_creator() {
    return ValueRepresentation::LongString;
  }

  if tag.is_private() || tag.is_item_or_delimitation() {
    return ValueRepresentation::Unknown;
  }

  entry_of(tag)
    .map(|entry| convert_vr(entry.vr()))
    .unwrap_or(ValueRepresentation::Unknown)
}

/// Returns the keyword of a tag, e.g. `"PatientName"`. Only keywords that
/// resolve back to the same tag through [`tag_of`] are returned.
///
pub fn keyword_of(tag: DataElementTag) -> Option<&'static str> {
  if tag.is_private() {
    return None;
  }

  entry_of(tag)
    .map(|entry| entry.alias())
    .filter(|keyword| tag_of(keyword) == Some(tag))
}

/// Returns the dictionary item for a tag that has a keyword.
///
pub fn find(tag: DataElementTag) -> Option<Item> {
  keyword_of(tag).map(|keyword| Item {
    tag,
    keyword,
    vr: vr_of(tag),
  })
}

/// Returns the tag for a keyword.
///
pub fn tag_of(keyword: &str) -> Option<DataElementTag> {
  DICTIONARY.by_name(keyword).map(|entry| {
    let tag = entry.tag();
    DataElementTag::new(tag.0, tag.1)
  })
}

/// Returns a readable name for a tag. This is the tag's keyword when it has
/// one.
///
pub fn tag_name(tag: DataElementTag) -> &'static str {
  match keyword_of(tag) {
    Some(keyword) => keyword,
    None if tag.is_group_length() => "Group Length",
    None if tag.is_private_creator() => "Private Creator",
    None if tag.is_private() => "Private Tag",
    None => "Unknown Tag",
  }
}

/// Formats a tag together with its name, e.g. `"(0010,0010) PatientName"`.
///
pub fn tag_with_name(tag: DataElementTag) -> String {
  format!("{} {}", tag, tag_name(tag))
}
