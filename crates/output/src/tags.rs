//! Tag records and the stream-tags projection
//!
//! Snapcast clients understand a small, fixed set of metadata fields; the
//! projection whitelists exactly those and drops everything else.

use serde_json::{Map, Value};

/// Kinds of metadata a track can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Artist,
    Album,
    AlbumArtist,
    Title,
    Composer,
    Performer,
    Genre,
    Date,
    MusicbrainzTrackId,
}

/// A track's metadata record: an ordered list of (kind, value) items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    items: Vec<(TagKind, String)>,
}

impl Tag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item
    pub fn add(&mut self, kind: TagKind, value: impl Into<String>) {
        self.items.push((kind, value.into()));
    }

    /// Builder-style [`add`](Self::add)
    pub fn with(mut self, kind: TagKind, value: impl Into<String>) -> Self {
        self.add(kind, value);
        self
    }

    /// First value of the given kind, if any
    pub fn value(&self, kind: TagKind) -> Option<&str> {
        self.items
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The tag kinds snapclients display, with their JSON field names
///
/// These fields are the ones the Snapcast stream-tags message documents;
/// everything else is dropped.
const STREAM_TAGS: [(TagKind, &str); 4] = [
    (TagKind::Artist, "artist"),
    (TagKind::Album, "album"),
    (TagKind::Title, "track"),
    (TagKind::MusicbrainzTrackId, "musicbrainzid"),
];

/// Project a tag record onto the stream-tags JSON object
///
/// Returns `None` when no whitelisted kind carries a value; an empty
/// projection sends no message.
pub fn stream_tags_json(tag: &Tag) -> Option<String> {
    let mut object = Map::new();

    for (kind, name) in STREAM_TAGS {
        if let Some(value) = tag.value(kind) {
            object.insert(name.to_owned(), Value::String(value.to_owned()));
        }
    }

    if object.is_empty() {
        return None;
    }

    Some(Value::Object(object).to_string())
}

#[cfg(test)]
#[path = "tags_test.rs"]
mod tests;
