//! Typed resource references
//!
//! Every store operation is addressed by a `ResourceRef`: a closed enum
//! over the resource kinds the store exposes. The textual scheme
//! (`item/3`, `item/next`, `classification-answer`, ...) is parsed exactly
//! once at the boundary; everything past the boundary works with the
//! matched variant, never with strings.

use std::fmt;

use crate::error::{Result, StoreError};

/// Path segment for the items table.
pub const URI_PART_ITEM: &str = "item";
/// Path segment used in place of an item id to mean "any eligible
/// unclassified item".
pub const URI_PART_NEXT: &str = "next";
/// Path segment for the cached-files table.
pub const URI_PART_FILE: &str = "file";
/// Path segment for the classification answers table.
pub const URI_PART_ANSWER: &str = "classification-answer";
/// Path segment for the classification checkboxes table.
pub const URI_PART_CHECKBOX: &str = "classification-checkbox";

/// A parsed reference to a store resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// The items collection.
    Items,
    /// A single item by row id.
    Item(i64),
    /// Virtual reference: resolves to some eligible unclassified item.
    NextItem,
    /// A single cached-file record by row id.
    File(i64),
    /// The classification answers collection.
    Answers,
    /// A single classification answer by row id.
    Answer(i64),
    /// The classification checkboxes collection.
    Checkboxes,
    /// A single classification checkbox by row id.
    Checkbox(i64),
}

impl ResourceRef {
    /// Parse a textual reference.
    ///
    /// Anything that does not match one of the known shapes, including a
    /// missing or non-numeric id segment, is an [`StoreError::InvalidReference`].
    pub fn parse(reference: &str) -> Result<Self> {
        let segments: Vec<&str> = reference.split('/').collect();
        let parsed = match segments.as_slice() {
            [URI_PART_ITEM] => Some(ResourceRef::Items),
            [URI_PART_ITEM, URI_PART_NEXT] => Some(ResourceRef::NextItem),
            [URI_PART_ITEM, id] => parse_id(id).map(ResourceRef::Item),
            [URI_PART_FILE, id] => parse_id(id).map(ResourceRef::File),
            [URI_PART_ANSWER] => Some(ResourceRef::Answers),
            [URI_PART_ANSWER, id] => parse_id(id).map(ResourceRef::Answer),
            [URI_PART_CHECKBOX] => Some(ResourceRef::Checkboxes),
            [URI_PART_CHECKBOX, id] => parse_id(id).map(ResourceRef::Checkbox),
            _ => None,
        };

        parsed.ok_or_else(|| StoreError::InvalidReference(reference.to_string()))
    }

    /// The row id for single-row references, if any.
    pub fn id(&self) -> Option<i64> {
        match self {
            ResourceRef::Item(id)
            | ResourceRef::File(id)
            | ResourceRef::Answer(id)
            | ResourceRef::Checkbox(id) => Some(*id),
            _ => None,
        }
    }
}

fn parse_id(segment: &str) -> Option<i64> {
    segment.parse::<i64>().ok().filter(|id| *id >= 0)
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Items => write!(f, "{}", URI_PART_ITEM),
            ResourceRef::Item(id) => write!(f, "{}/{}", URI_PART_ITEM, id),
            ResourceRef::NextItem => write!(f, "{}/{}", URI_PART_ITEM, URI_PART_NEXT),
            ResourceRef::File(id) => write!(f, "{}/{}", URI_PART_FILE, id),
            ResourceRef::Answers => write!(f, "{}", URI_PART_ANSWER),
            ResourceRef::Answer(id) => write!(f, "{}/{}", URI_PART_ANSWER, id),
            ResourceRef::Checkboxes => write!(f, "{}", URI_PART_CHECKBOX),
            ResourceRef::Checkbox(id) => write!(f, "{}/{}", URI_PART_CHECKBOX, id),
        }
    }
}
