//! Public-to-internal field name translation
//!
//! Callers address fields by the public names below; storage uses
//! snake_case column names. Every caller-supplied field name is translated
//! through the per-resource table before it reaches SQL. Unknown public
//! names are dropped silently, so the internal column set never leaks out
//! through the API and unexpected field names cannot smuggle raw column
//! expressions into a statement.

use crate::resource::ResourceRef;

/// Public field names for item resources.
pub mod item {
    pub const ID: &str = "id";
    pub const DONE: &str = "done";
    pub const UPLOADED: &str = "uploaded";
    pub const SUBJECT_ID: &str = "subjectId";
    pub const ZOONIVERSE_ID: &str = "zooniverseId";
    pub const GROUP_ID: &str = "groupId";
    pub const LOCATION_STANDARD_URI_REMOTE: &str = "locationStandardUriRemote";
    pub const LOCATION_STANDARD_URI: &str = "locationStandardUri";
    pub const LOCATION_STANDARD_DOWNLOADED: &str = "locationStandardDownloaded";
    pub const LOCATION_THUMBNAIL_URI_REMOTE: &str = "locationThumbnailUriRemote";
    pub const LOCATION_THUMBNAIL_URI: &str = "locationThumbnailUri";
    pub const LOCATION_THUMBNAIL_DOWNLOADED: &str = "locationThumbnailDownloaded";
    pub const LOCATION_INVERTED_URI_REMOTE: &str = "locationInvertedUriRemote";
    pub const LOCATION_INVERTED_URI: &str = "locationInvertedUri";
    pub const LOCATION_INVERTED_DOWNLOADED: &str = "locationInvertedDownloaded";
    pub const FAVORITE: &str = "favorite";
    pub const DATETIME_DONE: &str = "dateTimeDone";
}

/// Public field names for cached-file resources.
pub mod file {
    pub const ID: &str = "id";
    pub const FILE_DATA: &str = "fileData";
}

/// Public field names for classification-answer resources.
pub mod answer {
    pub const ID: &str = "id";
    pub const ITEM_ID: &str = "itemId";
    pub const SEQUENCE: &str = "sequence";
    pub const QUESTION_ID: &str = "questionId";
    pub const ANSWER_ID: &str = "answerId";
}

/// Public field names for classification-checkbox resources.
pub mod checkbox {
    pub const ID: &str = "id";
    pub const ITEM_ID: &str = "itemId";
    pub const SEQUENCE: &str = "sequence";
    pub const QUESTION_ID: &str = "questionId";
    pub const CHECKBOX_ID: &str = "checkboxId";
}

/// A `(public, internal)` field table for one resource kind.
pub type FieldTable = &'static [(&'static str, &'static str)];

pub const ITEM_FIELDS: FieldTable = &[
    (item::ID, "id"),
    (item::DONE, "done"),
    (item::UPLOADED, "uploaded"),
    (item::SUBJECT_ID, "subject_id"),
    (item::ZOONIVERSE_ID, "zooniverse_id"),
    (item::GROUP_ID, "group_id"),
    (item::LOCATION_STANDARD_URI_REMOTE, "location_standard_uri_remote"),
    (item::LOCATION_STANDARD_URI, "location_standard_uri"),
    (item::LOCATION_STANDARD_DOWNLOADED, "location_standard_downloaded"),
    (item::LOCATION_THUMBNAIL_URI_REMOTE, "location_thumbnail_uri_remote"),
    (item::LOCATION_THUMBNAIL_URI, "location_thumbnail_uri"),
    (item::LOCATION_THUMBNAIL_DOWNLOADED, "location_thumbnail_downloaded"),
    (item::LOCATION_INVERTED_URI_REMOTE, "location_inverted_uri_remote"),
    (item::LOCATION_INVERTED_URI, "location_inverted_uri"),
    (item::LOCATION_INVERTED_DOWNLOADED, "location_inverted_downloaded"),
    (item::FAVORITE, "favorite"),
    (item::DATETIME_DONE, "datetime_done"),
];

pub const FILE_FIELDS: FieldTable = &[(file::ID, "id"), (file::FILE_DATA, "file_data")];

pub const ANSWER_FIELDS: FieldTable = &[
    (answer::ID, "id"),
    (answer::ITEM_ID, "item_id"),
    (answer::SEQUENCE, "sequence"),
    (answer::QUESTION_ID, "question_id"),
    (answer::ANSWER_ID, "answer_id"),
];

pub const CHECKBOX_FIELDS: FieldTable = &[
    (checkbox::ID, "id"),
    (checkbox::ITEM_ID, "item_id"),
    (checkbox::SEQUENCE, "sequence"),
    (checkbox::QUESTION_ID, "question_id"),
    (checkbox::CHECKBOX_ID, "checkbox_id"),
];

/// The field table for a resource reference.
pub fn fields_for(reference: &ResourceRef) -> FieldTable {
    match reference {
        ResourceRef::Items | ResourceRef::Item(_) | ResourceRef::NextItem => ITEM_FIELDS,
        ResourceRef::File(_) => FILE_FIELDS,
        ResourceRef::Answers | ResourceRef::Answer(_) => ANSWER_FIELDS,
        ResourceRef::Checkboxes | ResourceRef::Checkbox(_) => CHECKBOX_FIELDS,
    }
}

/// Translate a public field name to its internal column name.
///
/// Returns `None` for unknown names; callers drop those silently.
pub fn internal(fields: FieldTable, public: &str) -> Option<&'static str> {
    fields
        .iter()
        .find(|(name, _)| *name == public)
        .map(|(_, column)| *column)
}
