//! Domain primitives shared by the dcmflow crates: data element tags, value
//! representations, transfer syntaxes, the data dictionary, and the tag path
//! and tag tree addressing types.

mod chain;
pub mod data_element_tag;
pub mod dictionary;
pub mod error;
pub mod tag_path;
pub mod tag_tree;
pub mod transfer_syntax;
pub mod utils;
pub mod value_representation;

pub use data_element_tag::DataElementTag;
pub use error::DcmflowError;
pub use tag_path::{TagPath, TagPathNode, TagPathTrunk};
pub use tag_tree::{TagTree, TagTreeNode, TagTreeTrunk};
pub use transfer_syntax::TransferSyntax;
pub use value_representation::{ValueLengthSize, ValueRepresentation};
