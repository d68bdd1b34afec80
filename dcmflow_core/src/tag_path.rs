//! Tag paths address one exact position in a data set, including positions
//! inside nested sequences and items.
//!
//! A tag path is an immutable chain of nodes rooted at the empty path. Every
//! node except the last is an item node, so the path leading to any node (its
//! "previous" path) is always a trunk: either the empty path or a path ending
//! in an item. This is enforced by only allowing paths to be extended through
//! [`TagPathTrunk`].
//!
//! Examples, as rendered by `Display`:
//!
//! - `"(0010,0010)"`: the *'(0010,0010) Patient's Name'* data element.
//! - `"(0008,1115)"`: the start of the *'(0008,1115) Referenced Series
//!   Sequence'* sequence.
//! - `"(0008,1115)[1].(0020,000E)"`: the *'(0020,000E) Series Instance UID'*
//!   data element in the first item of that sequence.
//! - `"(0008,1115)[1]:end"` and `"(0008,1115):end"`: the ends of that item and
//!   sequence.

use std::cmp::Ordering;

use crate::chain::Chain;
use crate::{dictionary, DataElementTag};

/// A single node in a [`TagPath`]. Item indices are 1-based.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagPathNode {
  /// A data element that isn't a sequence.
  Tag(DataElementTag),

  /// The start of a sequence.
  Sequence(DataElementTag),

  /// The end of a sequence.
  SequenceEnd(DataElementTag),

  /// An item in a sequence. The tag is the tag of the sequence.
  Item(DataElementTag, u32),

  /// The end of an item in a sequence.
  ItemEnd(DataElementTag, u32),
}

impl TagPathNode {
  /// Returns the tag of this node. For item nodes this is the tag of the
  /// sequence that contains the item.
  ///
  pub fn tag(&self) -> DataElementTag {
    match self {
      TagPathNode::Tag(tag)
      | TagPathNode::Sequence(tag)
      | TagPathNode::SequenceEnd(tag)
      | TagPathNode::Item(tag, _)
      | TagPathNode::ItemEnd(tag, _) => *tag,
    }
  }

  /// Returns the item index of item and item end nodes.
  ///
  pub fn item_index(&self) -> Option<u32> {
    match self {
      TagPathNode::Item(_, index) | TagPathNode::ItemEnd(_, index) => {
        Some(*index)
      }
      _ => None,
    }
  }

  /// The position of this node relative to other node kinds with the same tag
  /// when ordering paths. Item and item end share a rank and are separated by
  /// their indices.
  ///
  fn kind_rank(&self) -> u8 {
    match self {
      TagPathNode::Tag(_) | TagPathNode::Sequence(_) => 0,
      TagPathNode::Item(..) | TagPathNode::ItemEnd(..) => 1,
      TagPathNode::SequenceEnd(_) => 2,
    }
  }

  fn to_named_string(self, lookup: bool) -> String {
    let tag = format_tag(self.tag(), lookup);

    match self {
      TagPathNode::Tag(_) | TagPathNode::Sequence(_) => tag,
      TagPathNode::SequenceEnd(_) => format!("{}:end", tag),
      TagPathNode::Item(_, index) => format!("{}[{}]", tag, index),
      TagPathNode::ItemEnd(_, index) => format!("{}[{}]:end", tag, index),
    }
  }
}

/// Formats a tag for use in a rendered path, optionally substituting its
/// dictionary keyword.
///
pub(crate) fn format_tag(tag: DataElementTag, lookup: bool) -> String {
  if lookup {
    if let Some(keyword) = dictionary::keyword_of(tag) {
      return keyword.to_string();
    }
  }

  tag.to_string()
}

/// Parses a single tag written as a keyword, `(gggg,eeee)`, or `ggggeeee`.
///
pub(crate) fn parse_tag(s: &str) -> Result<DataElementTag, String> {
  DataElementTag::from_hex_string(s)
    .ok()
    .or_else(|| dictionary::tag_of(s))
    .ok_or_else(|| format!("Invalid tag '{}'", s))
}

/// An exact address of one position within a data set.
///
#[derive(Clone, Debug)]
pub struct TagPath(pub(crate) Chain<TagPathNode>);

/// A tag path that is either empty or ends in an item, and can therefore be
/// extended with further nodes.
///
#[derive(Clone, Debug)]
pub struct TagPathTrunk(TagPath);

impl std::ops::Deref for TagPathTrunk {
  type Target = TagPath;

  fn deref(&self) -> &TagPath {
    &self.0
  }
}

impl From<TagPathTrunk> for TagPath {
  fn from(trunk: TagPathTrunk) -> TagPath {
    trunk.0
  }
}

impl Default for TagPathTrunk {
  fn default() -> Self {
    Self::empty()
  }
}

impl TagPathTrunk {
  /// Returns the empty path, which addresses the root data set.
  ///
  pub fn empty() -> Self {
    Self(TagPath(Chain::empty()))
  }

  /// Returns the path to a data element under this trunk.
  ///
  pub fn then_tag(&self, tag: DataElementTag) -> TagPath {
    self.push(TagPathNode::Tag(tag))
  }

  /// Returns the path to the start of a sequence under this trunk.
  ///
  pub fn then_sequence(&self, tag: DataElementTag) -> TagPath {
    self.push(TagPathNode::Sequence(tag))
  }

  /// Returns the path to the end of a sequence under this trunk.
  ///
  pub fn then_sequence_end(&self, tag: DataElementTag) -> TagPath {
    self.push(TagPathNode::SequenceEnd(tag))
  }

  /// Returns the path to an item in the sequence `tag` under this trunk.
  ///
  pub fn then_item(&self, tag: DataElementTag, index: u32) -> TagPathTrunk {
    TagPathTrunk(self.push(TagPathNode::Item(tag, index)))
  }

  /// Returns the path to the end of an item in the sequence `tag` under this
  /// trunk.
  ///
  pub fn then_item_end(&self, tag: DataElementTag, index: u32) -> TagPath {
    self.push(TagPathNode::ItemEnd(tag, index))
  }

  fn push(&self, node: TagPathNode) -> TagPath {
    TagPath(self.0 .0.push(node))
  }
}

impl Default for TagPath {
  fn default() -> Self {
    Self::empty()
  }
}

impl TagPath {
  /// Returns the empty path.
  ///
  pub fn empty() -> Self {
    TagPathTrunk::empty().into()
  }

  /// Returns a root-level path to a data element.
  ///
  pub fn from_tag(tag: DataElementTag) -> Self {
    TagPathTrunk::empty().then_tag(tag)
  }

  /// Returns a root-level path to the start of a sequence.
  ///
  pub fn from_sequence(tag: DataElementTag) -> Self {
    TagPathTrunk::empty().then_sequence(tag)
  }

  /// Returns a root-level path to the end of a sequence.
  ///
  pub fn from_sequence_end(tag: DataElementTag) -> Self {
    TagPathTrunk::empty().then_sequence_end(tag)
  }

  /// Returns a root-level path to an item.
  ///
  pub fn from_item(tag: DataElementTag, index: u32) -> TagPathTrunk {
    TagPathTrunk::empty().then_item(tag, index)
  }

  /// Returns a root-level path to the end of an item.
  ///
  pub fn from_item_end(tag: DataElementTag, index: u32) -> Self {
    TagPathTrunk::empty().then_item_end(tag, index)
  }

  /// Returns the last node of this path, or `None` for the empty path.
  ///
  pub fn node(&self) -> Option<TagPathNode> {
    self.0.last()
  }

  /// Returns the tag of the last node of this path.
  ///
  pub fn tag(&self) -> Option<DataElementTag> {
    self.node().map(|node| node.tag())
  }

  /// Returns the trunk this path extends. The previous path of the empty path
  /// is the empty path.
  ///
  pub fn previous(&self) -> TagPathTrunk {
    TagPathTrunk(TagPath(self.0.previous()))
  }

  /// Returns this path as a trunk if it is empty or ends in an item.
  ///
  pub fn as_trunk(&self) -> Option<TagPathTrunk> {
    match self.node() {
      None | Some(TagPathNode::Item(..)) => Some(TagPathTrunk(self.clone())),
      _ => None,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.depth() == 0
  }

  /// Returns whether this path has exactly one node.
  ///
  pub fn is_root(&self) -> bool {
    self.depth() == 1
  }

  /// Returns the number of nodes in this path.
  ///
  pub fn depth(&self) -> usize {
    self.0.depth()
  }

  /// Returns the nodes of this path, starting at the root.
  ///
  pub fn nodes(&self) -> Vec<TagPathNode> {
    self.0.nodes()
  }

  /// Returns the path made of the first `n` nodes of this path.
  ///
  pub fn take(&self, n: usize) -> TagPath {
    TagPath(self.0.take(n))
  }

  /// Returns this path with the first `n` nodes removed. Dropping all nodes
  /// gives the empty path.
  ///
  pub fn drop(&self, n: usize) -> TagPath {
    TagPath(self.0.drop(n))
  }

  /// Returns whether both paths have identical nodes.
  ///
  pub fn is_equal_to(&self, other: &TagPath) -> bool {
    self.depth() == other.depth() && self.nodes() == other.nodes()
  }

  /// Returns whether this path sorts strictly before `other`. Paths are
  /// compared node by node from the root:
  ///
  /// - Differing tags order numerically.
  /// - For the same tag, a sequence start sorts before its items, and its
  ///   items sort before its end.
  /// - Items order by index, and an item sorts before its own end.
  /// - A path that is a strict prefix of another sorts before it, so the empty
  ///   path sorts before every non-empty path.
  ///
  pub fn is_below(&self, other: &TagPath) -> bool {
    let these = self.nodes();
    let those = other.nodes();

    for (a, b) in these.iter().zip(those.iter()) {
      if a.tag() != b.tag() {
        return a.tag() < b.tag();
      }

      if a.kind_rank() != b.kind_rank() {
        return a.kind_rank() < b.kind_rank();
      }

      if let (Some(i), Some(j)) = (a.item_index(), b.item_index()) {
        if i != j {
          return i < j;
        }

        let a_is_end = matches!(a, TagPathNode::ItemEnd(..));
        let b_is_end = matches!(b, TagPathNode::ItemEnd(..));
        if a_is_end != b_is_end {
          return b_is_end;
        }
      }
    }

    these.len() < those.len()
  }

  /// Returns whether this path begins with all the nodes of `prefix`.
  ///
  pub fn starts_with(&self, prefix: &TagPath) -> bool {
    self.depth() >= prefix.depth()
      && self.take(prefix.depth()).is_equal_to(prefix)
  }

  /// Returns whether this path finishes with all the nodes of `suffix`.
  ///
  pub fn ends_with(&self, suffix: &TagPath) -> bool {
    self.depth() >= suffix.depth()
      && self.drop(self.depth() - suffix.depth()).is_equal_to(suffix)
  }

  /// Renders this path, optionally replacing tags with their dictionary
  /// keywords where one is known.
  ///
  pub fn to_named_string(&self, lookup: bool) -> String {
    self
      .nodes()
      .into_iter()
      .map(|node| node.to_named_string(lookup))
      .collect::<Vec<_>>()
      .join(".")
  }

  /// Parses a path to a data element, e.g. `"(0008,1115)[1].(0020,000E)"` or
  /// `"ReferencedSeriesSequence[1].SeriesInstanceUID"`. Every node except the
  /// last must be an item, and the last node is a data element.
  ///
  pub fn parse(s: &str) -> Result<TagPath, String> {
    let parts: Vec<&str> = s.split('.').collect();
    let (last, trunk_parts) = match parts.split_last() {
      Some(split) if !s.is_empty() => split,
      _ => return Err("Tag path is empty".to_string()),
    };

    let mut trunk = TagPathTrunk::empty();
    for part in trunk_parts {
      let (tag, index) = parse_item_node(part)?;
      let index = index
        .parse::<u32>()
        .ok()
        .filter(|i| *i > 0)
        .ok_or_else(|| format!("Invalid item index in '{}'", part))?;

      trunk = trunk.then_item(tag, index);
    }

    Ok(trunk.then_tag(parse_tag(last)?))
  }
}

/// Splits an item node such as `"(0008,1115)[2]"` into its tag and the text
/// inside the brackets.
///
pub(crate) fn parse_item_node(s: &str) -> Result<(DataElementTag, &str), String> {
  let (tag, rest) = s
    .split_once('[')
    .ok_or_else(|| format!("Expected an item node but found '{}'", s))?;

  let index = rest
    .strip_suffix(']')
    .ok_or_else(|| format!("Unterminated item index in '{}'", s))?;

  Ok((parse_tag(tag)?, index))
}

impl PartialEq for TagPath {
  fn eq(&self, other: &Self) -> bool {
    self.is_equal_to(other)
  }
}

impl PartialOrd for TagPath {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    if self.is_equal_to(other) {
      Some(Ordering::Equal)
    } else if self.is_below(other) {
      Some(Ordering::Less)
    } else {
      Some(Ordering::Greater)
    }
  }
}

impl std::fmt::Display for TagPath {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(&self.to_named_string(false))
  }
}
