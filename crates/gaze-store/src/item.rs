//! Typed rows for the items and files tables

use serde::{Deserialize, Serialize};

/// One image variant of a subject: its remote location, the reference to
/// its local cache file, and whether the download has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLocation {
    pub uri_remote: Option<String>,
    pub uri: Option<String>,
    pub downloaded: bool,
}

/// One subject to classify.
///
/// Created by the subject importer when new subjects arrive, mutated by the
/// downloader (the `downloaded` flags) and by the classification writer
/// (`done`, `favorite`, `datetime_done`). Items are only ever removed by an
/// explicit delete, which also reclaims the three cached image files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub done: bool,
    pub uploaded: bool,
    pub subject_id: String,
    pub zooniverse_id: Option<String>,
    pub group_id: Option<String>,
    pub standard: ImageLocation,
    pub thumbnail: ImageLocation,
    pub inverted: ImageLocation,
    pub favorite: bool,
    /// ISO-8601 UTC completion timestamp, second precision.
    pub datetime_done: Option<String>,
}

impl Item {
    /// An item can be offered for classification only when it is not done
    /// and all three image variants have finished downloading.
    pub fn ready_for_classification(&self) -> bool {
        !self.done
            && self.standard.downloaded
            && self.thumbnail.downloaded
            && self.inverted.downloaded
    }
}

/// An indirection record mapping a file id to an absolute on-disk path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFile {
    pub id: i64,
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloaded() -> ImageLocation {
        ImageLocation {
            uri_remote: Some("https://example.org/img.jpg".into()),
            uri: Some("file/1".into()),
            downloaded: true,
        }
    }

    #[test]
    fn readiness_requires_all_three_downloads() {
        let mut item = Item {
            id: 1,
            done: false,
            uploaded: false,
            subject_id: "S1".into(),
            zooniverse_id: None,
            group_id: None,
            standard: downloaded(),
            thumbnail: downloaded(),
            inverted: downloaded(),
            favorite: false,
            datetime_done: None,
        };
        assert!(item.ready_for_classification());

        item.inverted.downloaded = false;
        assert!(!item.ready_for_classification());

        item.inverted.downloaded = true;
        item.done = true;
        assert!(!item.ready_for_classification());
    }
}
