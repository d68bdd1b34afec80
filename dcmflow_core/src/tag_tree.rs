//! Tag trees are patterns over tag paths. They have the same shape as a
//! [`TagPath`], except that item nodes may leave their index unspecified, in
//! which case they match an item with any index at that depth.
//!
//! Tag trees are used to decide whether a tag path qualifies for some
//! operation, e.g. "every `(0020,000E)` inside any item of `(0008,1115)`",
//! which is written `"(0008,1115)[*].(0020,000E)"`.

use crate::chain::Chain;
use crate::tag_path::{format_tag, parse_item_node, parse_tag};
use crate::{DataElementTag, TagPath, TagPathNode};

/// A single node in a [`TagTree`]. An item index of `None` matches any item.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagTreeNode {
  Tag(DataElementTag),
  Sequence(DataElementTag),
  SequenceEnd(DataElementTag),
  Item(DataElementTag, Option<u32>),
  ItemEnd(DataElementTag, Option<u32>),
}

impl TagTreeNode {
  pub fn tag(&self) -> DataElementTag {
    match self {
      TagTreeNode::Tag(tag)
      | TagTreeNode::Sequence(tag)
      | TagTreeNode::SequenceEnd(tag)
      | TagTreeNode::Item(tag, _)
      | TagTreeNode::ItemEnd(tag, _) => *tag,
    }
  }

  fn item_index(&self) -> Option<u32> {
    match self {
      TagTreeNode::Item(_, index) | TagTreeNode::ItemEnd(_, index) => *index,
      _ => None,
    }
  }

  /// Returns whether this node has exactly the shape of a path node, with a
  /// wildcard index matching any item index.
  ///
  fn matches_node(&self, node: &TagPathNode) -> bool {
    fn index_matches(pattern: Option<u32>, index: u32) -> bool {
      pattern.map_or(true, |i| i == index)
    }

    match (self, node) {
      (TagTreeNode::Tag(a), TagPathNode::Tag(b))
      | (TagTreeNode::Sequence(a), TagPathNode::Sequence(b))
      | (TagTreeNode::SequenceEnd(a), TagPathNode::SequenceEnd(b)) => a == b,

      (TagTreeNode::Item(a, i), TagPathNode::Item(b, j))
      | (TagTreeNode::ItemEnd(a, i), TagPathNode::ItemEnd(b, j)) => {
        a == b && index_matches(*i, *j)
      }

      _ => false,
    }
  }

  /// Returns whether this node addresses the same position as a path node.
  /// Sequence and item boundaries of the same sequence are interchangeable,
  /// and indices only need to agree when both sides have one. A plain tag
  /// only matches a plain tag.
  ///
  fn matches_address(&self, node: &TagPathNode) -> bool {
    if self.tag() != node.tag() {
      return false;
    }

    match (self, node) {
      (TagTreeNode::Tag(_), TagPathNode::Tag(_)) => true,
      (TagTreeNode::Tag(_), _) | (_, TagPathNode::Tag(_)) => false,

      _ => match (self.item_index(), node.item_index()) {
        (Some(i), Some(j)) => i == j,
        _ => true,
      },
    }
  }

  fn to_named_string(self, lookup: bool) -> String {
    fn index_string(index: Option<u32>) -> String {
      index.map_or_else(|| "*".to_string(), |i| i.to_string())
    }

    let tag = format_tag(self.tag(), lookup);

    match self {
      TagTreeNode::Tag(_) | TagTreeNode::Sequence(_) => tag,
      TagTreeNode::SequenceEnd(_) => format!("{}:end", tag),
      TagTreeNode::Item(_, index) => {
        format!("{}[{}]", tag, index_string(index))
      }
      TagTreeNode::ItemEnd(_, index) => {
        format!("{}[{}]:end", tag, index_string(index))
      }
    }
  }
}

impl From<TagPathNode> for TagTreeNode {
  fn from(node: TagPathNode) -> Self {
    match node {
      TagPathNode::Tag(tag) => TagTreeNode::Tag(tag),
      TagPathNode::Sequence(tag) => TagTreeNode::Sequence(tag),
      TagPathNode::SequenceEnd(tag) => TagTreeNode::SequenceEnd(tag),
      TagPathNode::Item(tag, index) => TagTreeNode::Item(tag, Some(index)),
      TagPathNode::ItemEnd(tag, index) => {
        TagTreeNode::ItemEnd(tag, Some(index))
      }
    }
  }
}

/// A pattern that matches a set of tag paths.
///
#[derive(Clone, Debug)]
pub struct TagTree(Chain<TagTreeNode>);

/// A tag tree that is either empty or ends in an item, and can therefore be
/// extended.
///
#[derive(Clone, Debug)]
pub struct TagTreeTrunk(TagTree);

impl std::ops::Deref for TagTreeTrunk {
  type Target = TagTree;

  fn deref(&self) -> &TagTree {
    &self.0
  }
}

impl From<TagTreeTrunk> for TagTree {
  fn from(trunk: TagTreeTrunk) -> TagTree {
    trunk.0
  }
}

impl Default for TagTreeTrunk {
  fn default() -> Self {
    Self::empty()
  }
}

impl TagTreeTrunk {
  pub fn empty() -> Self {
    Self(TagTree(Chain::empty()))
  }

  pub fn then_tag(&self, tag: DataElementTag) -> TagTree {
    self.push(TagTreeNode::Tag(tag))
  }

  pub fn then_sequence(&self, tag: DataElementTag) -> TagTree {
    self.push(TagTreeNode::Sequence(tag))
  }

  pub fn then_sequence_end(&self, tag: DataElementTag) -> TagTree {
    self.push(TagTreeNode::SequenceEnd(tag))
  }

  pub fn then_item(&self, tag: DataElementTag, index: u32) -> TagTreeTrunk {
    TagTreeTrunk(self.push(TagTreeNode::Item(tag, Some(index))))
  }

  /// Extends this trunk with an item of the sequence `tag` that matches any
  /// item index.
  ///
  pub fn then_any_item(&self, tag: DataElementTag) -> TagTreeTrunk {
    TagTreeTrunk(self.push(TagTreeNode::Item(tag, None)))
  }

  pub fn then_item_end(&self, tag: DataElementTag, index: u32) -> TagTree {
    self.push(TagTreeNode::ItemEnd(tag, Some(index)))
  }

  pub fn then_any_item_end(&self, tag: DataElementTag) -> TagTree {
    self.push(TagTreeNode::ItemEnd(tag, None))
  }

  fn push(&self, node: TagTreeNode) -> TagTree {
    TagTree(self.0 .0.push(node))
  }
}

impl TagTree {
  pub fn empty() -> Self {
    TagTreeTrunk::empty().into()
  }

  pub fn from_tag(tag: DataElementTag) -> Self {
    TagTreeTrunk::empty().then_tag(tag)
  }

  pub fn from_item(tag: DataElementTag, index: u32) -> TagTreeTrunk {
    TagTreeTrunk::empty().then_item(tag, index)
  }

  pub fn from_any_item(tag: DataElementTag) -> TagTreeTrunk {
    TagTreeTrunk::empty().then_any_item(tag)
  }

  /// Creates a tag tree that matches exactly one tag path.
  ///
  pub fn from_path(path: &TagPath) -> Self {
    TagTree(
      path
        .nodes()
        .into_iter()
        .fold(Chain::empty(), |chain, node| chain.push(node.into())),
    )
  }

  pub fn node(&self) -> Option<TagTreeNode> {
    self.0.last()
  }

  pub fn previous(&self) -> TagTreeTrunk {
    TagTreeTrunk(TagTree(self.0.previous()))
  }

  pub fn depth(&self) -> usize {
    self.0.depth()
  }

  pub fn is_empty(&self) -> bool {
    self.depth() == 0
  }

  pub fn nodes(&self) -> Vec<TagTreeNode> {
    self.0.nodes()
  }

  pub fn take(&self, n: usize) -> TagTree {
    TagTree(self.0.take(n))
  }

  pub fn drop(&self, n: usize) -> TagTree {
    TagTree(self.0.drop(n))
  }

  /// Returns whether `path` has exactly the shape of this tree, i.e. the same
  /// depth and the same node kinds and tags at every level. Wildcard items in
  /// this tree match items with any index.
  ///
  pub fn has_path(&self, path: &TagPath) -> bool {
    self.depth() == path.depth()
      && self
        .nodes()
        .iter()
        .zip(path.nodes().iter())
        .all(|(a, b)| a.matches_node(b))
  }

  /// Returns whether `path` addresses a prefix of this tree. The path may be
  /// the same depth as the tree or shallower.
  ///
  /// Nodes are compared by address, so e.g. a path that ends at the start of
  /// a sequence is a trunk of a tree that continues into that sequence's
  /// items.
  ///
  pub fn has_trunk(&self, path: &TagPath) -> bool {
    self.depth() >= path.depth()
      && self.take(path.depth()).matches_address(path)
  }

  /// Returns whether this tree addresses a prefix of `path`. The tree may be
  /// the same depth as the path or shallower.
  ///
  pub fn is_trunk_of(&self, path: &TagPath) -> bool {
    self.depth() <= path.depth()
      && self.matches_address(&path.take(self.depth()))
  }

  /// Returns whether `path` has exactly the shape of the final nodes of this
  /// tree.
  ///
  pub fn has_twig(&self, path: &TagPath) -> bool {
    self.depth() >= path.depth()
      && self.drop(self.depth() - path.depth()).has_path(path)
  }

  fn matches_address(&self, path: &TagPath) -> bool {
    self.depth() == path.depth()
      && self
        .nodes()
        .iter()
        .zip(path.nodes().iter())
        .all(|(a, b)| a.matches_address(b))
  }

  /// Renders this tree, optionally replacing tags with their dictionary
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

  /// Parses a tree that ends in a data element, e.g.
  /// `"(0008,1115)[*].(0020,000E)"`. Item indices are either a positive
  /// number or `*` to match any item.
  ///
  pub fn parse(s: &str) -> Result<TagTree, String> {
    let parts: Vec<&str> = s.split('.').collect();
    let (last, trunk_parts) = match parts.split_last() {
      Some(split) if !s.is_empty() => split,
      _ => return Err("Tag tree is empty".to_string()),
    };

    let mut trunk = TagTreeTrunk::empty();
    for part in trunk_parts {
      let (tag, index) = parse_item_node(part)?;

      trunk = if index == "*" {
        trunk.then_any_item(tag)
      } else {
        let index = index
          .parse::<u32>()
          .ok()
          .filter(|i| *i > 0)
          .ok_or_else(|| format!("Invalid item index in '{}'", part))?;

        trunk.then_item(tag, index)
      };
    }

    Ok(trunk.then_tag(parse_tag(last)?))
  }
}

impl PartialEq for TagTree {
  fn eq(&self, other: &Self) -> bool {
    self.nodes() == other.nodes()
  }
}

impl std::fmt::Display for TagTree {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(&self.to_named_string(false))
  }
}
