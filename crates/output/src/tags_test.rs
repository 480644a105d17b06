//! Tag projection tests

use serde_json::Value;

use super::*;

fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

// ============================================================================
// Tag record
// ============================================================================

#[test]
fn test_value_returns_first_match() {
    let tag = Tag::new()
        .with(TagKind::Artist, "First")
        .with(TagKind::Artist, "Second");

    assert_eq!(tag.value(TagKind::Artist), Some("First"));
}

#[test]
fn test_value_missing_kind() {
    let tag = Tag::new().with(TagKind::Artist, "A");
    assert_eq!(tag.value(TagKind::Genre), None);
}

#[test]
fn test_empty_tag() {
    assert!(Tag::new().is_empty());
    assert!(!Tag::new().with(TagKind::Title, "T").is_empty());
}

// ============================================================================
// Stream-tags projection
// ============================================================================

#[test]
fn test_whitelist_mapping_is_exact() {
    let tag = Tag::new()
        .with(TagKind::Artist, "a")
        .with(TagKind::Album, "b")
        .with(TagKind::Title, "c")
        .with(TagKind::MusicbrainzTrackId, "d");

    let json = parse(&stream_tags_json(&tag).unwrap());
    assert_eq!(
        json,
        parse(r#"{"artist":"a","album":"b","track":"c","musicbrainzid":"d"}"#)
    );
}

#[test]
fn test_non_whitelisted_kinds_are_dropped() {
    let tag = Tag::new()
        .with(TagKind::Artist, "A")
        .with(TagKind::Title, "T")
        .with(TagKind::Composer, "C")
        .with(TagKind::Genre, "G")
        .with(TagKind::Date, "2024");

    let json = parse(&stream_tags_json(&tag).unwrap());
    assert_eq!(json, parse(r#"{"artist":"A","track":"T"}"#));
}

#[test]
fn test_title_maps_to_track() {
    let tag = Tag::new().with(TagKind::Title, "Song");
    let json = parse(&stream_tags_json(&tag).unwrap());

    assert_eq!(json["track"], "Song");
    assert!(json.get("title").is_none());
}

#[test]
fn test_empty_projection_sends_nothing() {
    assert!(stream_tags_json(&Tag::new()).is_none());

    // Non-empty tag, but nothing whitelisted
    let tag = Tag::new()
        .with(TagKind::Composer, "C")
        .with(TagKind::Performer, "P");
    assert!(stream_tags_json(&tag).is_none());
}

#[test]
fn test_album_artist_is_not_artist() {
    let tag = Tag::new().with(TagKind::AlbumArtist, "AA");
    assert!(stream_tags_json(&tag).is_none());
}
