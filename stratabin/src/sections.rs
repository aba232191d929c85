//! Writing sections codec
//!
//! A canvas stores its writing document as a single string. The editor works
//! on a list of sections instead: plain text blocks and two-column "split"
//! blocks used to compare two ideas side by side.
//!
//! Documents are written as a tagged JSON document. Older documents used
//! sentinel markers embedded in the text; those are still decoded so existing
//! workspaces keep their content:
//!
//! - `[[section:<id>]]` starts a section carrying a persistent id
//! - `[[split]] ... [[/split]]` wraps a split section
//! - inside an id-delimited split: `lt [[split:item]] rt [[split:pair]] lc [[split:item]] rc`
//! - inside an undelimited split: `[[split:title]] title [[split:content]] content` per column

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SECTION_ID_START: &str = "[[section:";
const SECTION_ID_END: &str = "]]";
const SPLIT_BEGIN: &str = "[[split]]";
const SPLIT_END: &str = "[[/split]]";
const SPLIT_PAIR_SEP: &str = "[[split:pair]]";
const SPLIT_ITEM_SEP: &str = "[[split:item]]";
const SPLIT_TITLE_SEP: &str = "[[split:title]]";
const SPLIT_CONTENT_SEP: &str = "[[split:content]]";

/// Current version of the tagged section document
const DOCUMENT_VERSION: u32 = 1;

/// One independently rendered block of a writing document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Section {
    Plain {
        id: String,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Split {
        id: String,
        left_title: String,
        right_title: String,
        left_content: String,
        right_content: String,
    },
}

impl Section {
    /// New plain section with a fresh id
    pub fn plain(content: impl Into<String>) -> Self {
        Section::Plain {
            id: new_section_id(),
            content: content.into(),
        }
    }

    /// New split section with a fresh id
    pub fn split(
        left_title: impl Into<String>,
        right_title: impl Into<String>,
        left_content: impl Into<String>,
        right_content: impl Into<String>,
    ) -> Self {
        Section::Split {
            id: new_section_id(),
            left_title: left_title.into(),
            right_title: right_title.into(),
            left_content: left_content.into(),
            right_content: right_content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SectionDocument {
    #[serde(rename = "stratabinSections")]
    version: u32,
    sections: Vec<Section>,
}

fn new_section_id() -> String {
    format!("section-{}", Uuid::new_v4())
}

/// Encode sections into the persisted writing content string
pub fn encode(sections: &[Section]) -> String {
    let document = SectionDocument {
        version: DOCUMENT_VERSION,
        sections: sections.to_vec(),
    };

    // A Vec of plain string-field enums always serializes
    serde_json::to_string(&document).unwrap_or_default()
}

/// Decode persisted writing content into sections.
///
/// Never fails: content that matches no known shape comes back as a single
/// plain section wrapping the raw text, and the result is never empty.
pub fn decode(raw: &str) -> Vec<Section> {
    if let Some(document) = parse_document(raw) {
        if document.sections.is_empty() {
            return vec![Section::plain("")];
        }
        return document.sections;
    }

    let sections = if raw.contains(SECTION_ID_START) {
        decode_delimited(raw)
    } else {
        decode_legacy(raw)
    };

    if sections.is_empty() {
        tracing::debug!("Writing content matched no section format, wrapping as plain text");
        return vec![Section::plain(raw)];
    }

    sections
}

/// Flatten sections into readable text (for search and chat context)
pub fn to_plain_text(sections: &[Section]) -> String {
    let mut parts = Vec::with_capacity(sections.len());

    for section in sections {
        match section {
            Section::Plain { content, .. } => {
                if !content.trim().is_empty() {
                    parts.push(content.clone());
                }
            }
            Section::Split {
                left_title,
                right_title,
                left_content,
                right_content,
                ..
            } => {
                parts.push(format!("{}: {}", left_title, left_content));
                parts.push(format!("{}: {}", right_title, right_content));
            }
        }
    }

    parts.join("\n")
}

fn parse_document(raw: &str) -> Option<SectionDocument> {
    let trimmed = raw.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str::<SectionDocument>(trimmed).ok()
}

fn decode_delimited(raw: &str) -> Vec<Section> {
    let mut sections = Vec::new();

    for block in raw.split(SECTION_ID_START) {
        let Some((id, content)) = block.split_once(SECTION_ID_END) else {
            continue;
        };

        let id = match id.trim() {
            "" => new_section_id(),
            id => id.to_string(),
        };

        if let Some(start) = content.find(SPLIT_BEGIN) {
            let inner = &content[start + SPLIT_BEGIN.len()..];
            let inner = match inner.find(SPLIT_END) {
                Some(end) => &inner[..end],
                None => inner,
            };
            sections.push(parse_delimited_split(id, inner));
        } else {
            sections.push(Section::Plain {
                id,
                content: content.trim().to_string(),
            });
        }
    }

    sections
}

fn parse_delimited_split(id: String, inner: &str) -> Section {
    let (titles, contents) = inner.split_once(SPLIT_PAIR_SEP).unwrap_or((inner, ""));
    let (left_title, right_title) = titles.split_once(SPLIT_ITEM_SEP).unwrap_or((titles, ""));
    let (left_content, right_content) = contents
        .split_once(SPLIT_ITEM_SEP)
        .unwrap_or((contents, ""));

    Section::Split {
        id,
        left_title: left_title.trim().to_string(),
        right_title: right_title.trim().to_string(),
        left_content: left_content.trim().to_string(),
        right_content: right_content.trim().to_string(),
    }
}

fn decode_legacy(raw: &str) -> Vec<Section> {
    let has_split_triad =
        raw.contains(SPLIT_BEGIN) && raw.contains(SPLIT_END) && raw.contains(SPLIT_TITLE_SEP);

    if !has_split_triad {
        if raw.trim().is_empty() {
            return vec![Section::plain("")];
        }
        return Vec::new();
    }

    let mut sections = Vec::new();
    let mut rest = raw;

    loop {
        let Some(start) = rest.find(SPLIT_BEGIN) else {
            push_plain_region(&mut sections, rest);
            break;
        };

        push_plain_region(&mut sections, &rest[..start]);
        let after = &rest[start + SPLIT_BEGIN.len()..];

        match after.find(SPLIT_END) {
            Some(end) => {
                sections.push(parse_legacy_split(&after[..end]));
                rest = &after[end + SPLIT_END.len()..];
            }
            None => {
                sections.push(parse_legacy_split(after));
                break;
            }
        }
    }

    sections
}

fn push_plain_region(sections: &mut Vec<Section>, region: &str) {
    let region = region.trim();
    if !region.is_empty() {
        sections.push(Section::plain(region));
    }
}

fn parse_legacy_split(inner: &str) -> Section {
    let columns: Vec<(String, String)> = inner
        .split(SPLIT_TITLE_SEP)
        .skip(1)
        .map(|column| match column.split_once(SPLIT_CONTENT_SEP) {
            Some((title, content)) => (title.trim().to_string(), content.trim().to_string()),
            None => (column.trim().to_string(), String::new()),
        })
        .collect();

    let mut columns = columns.into_iter();
    let (left_title, left_content) = columns.next().unwrap_or_default();
    let (right_title, right_content) = columns.next().unwrap_or_default();

    Section::split(left_title, right_title, left_content, right_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn marker() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(SECTION_ID_START.to_string()),
            Just(SECTION_ID_END.to_string()),
            Just(SPLIT_BEGIN.to_string()),
            Just(SPLIT_END.to_string()),
            Just(SPLIT_PAIR_SEP.to_string()),
            Just(SPLIT_ITEM_SEP.to_string()),
            Just(SPLIT_TITLE_SEP.to_string()),
            Just(SPLIT_CONTENT_SEP.to_string()),
        ]
    }

    /// Free text interleaved with marker tokens
    fn marked_text() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![marker(), "[a-zA-Z0-9 {}:\\[\\]\n]{0,10}", "\\PC{0,6}"],
            0..12,
        )
        .prop_map(|parts| parts.concat())
    }

    fn section() -> impl Strategy<Value = Section> {
        let id = "[a-z0-9-]{1,12}";
        prop_oneof![
            (id, marked_text()).prop_map(|(id, content)| Section::Plain { id, content }),
            (id, marked_text(), marked_text(), marked_text(), marked_text()).prop_map(
                |(id, left_title, right_title, left_content, right_content)| Section::Split {
                    id,
                    left_title,
                    right_title,
                    left_content,
                    right_content,
                }
            ),
        ]
    }

    proptest! {
        #[test]
        fn test_decoded_sections_are_a_fixed_point(raw in marked_text()) {
            let first = decode(&raw);
            prop_assert!(!first.is_empty());
            prop_assert_eq!(decode(&encode(&first)), first);
        }

        #[test]
        fn test_encoded_sections_decode_unchanged(
            sections in prop::collection::vec(section(), 1..6)
        ) {
            prop_assert_eq!(decode(&encode(&sections)), sections);
        }
    }

    #[test]
    fn test_decode_empty_yields_single_plain_section() {
        let sections = decode("");
        assert_eq!(sections.len(), 1);
        match &sections[0] {
            Section::Plain { id, content } => {
                assert!(!id.is_empty());
                assert!(content.is_empty());
            }
            other => panic!("expected plain section, got {:?}", other),
        }
    }

    #[test]
    fn test_split_section_round_trip() {
        let encoded = encode(&[Section::split("Pros", "Cons", "Fast", "Slow")]);
        let decoded = decode(&encoded);

        assert_eq!(decoded.len(), 1);
        match &decoded[0] {
            Section::Split {
                left_title,
                right_title,
                left_content,
                right_content,
                ..
            } => {
                assert_eq!(left_title, "Pros");
                assert_eq!(right_title, "Cons");
                assert_eq!(left_content, "Fast");
                assert_eq!(right_content, "Slow");
            }
            other => panic!("expected split section, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_is_fixed_point_after_encode() {
        let inputs = [
            "",
            "   \n  ",
            "just some notes",
            "[[section:a]] first [[section:b]][[split]]L[[split:item]]R[[split:pair]]x[[split:item]]y[[/split]]",
            "intro [[split]][[split:title]]Pros[[split:content]]Fast[[split:title]]Cons[[split:content]]Slow[[/split]] outro",
            "[[section:]]no id",
            "{ not json",
            r#"{"stratabinSections":1,"sections":[]}"#,
            "tricky ]] text with [[split]] but no triad",
        ];

        for input in inputs {
            let first = decode(input);
            let second = decode(&encode(&first));
            assert_eq!(first, second, "decode/encode not stable for {:?}", input);
        }
    }

    #[test]
    fn test_encode_preserves_ids_and_order() {
        let sections = vec![
            Section::Plain {
                id: "one".to_string(),
                content: "  keeps whitespace  ".to_string(),
            },
            Section::split("A", "B", "c", "d"),
            Section::plain("[[section:fake]] sentinel text is just content"),
        ];

        assert_eq!(decode(&encode(&sections)), sections);
    }

    #[test]
    fn test_delimited_blocks_without_id_end_are_dropped() {
        let sections = decode("[[section:kept]]hello[[section:no end marker here");
        assert_eq!(sections.len(), 1);
        assert!(matches!(&sections[0], Section::Plain { id, content } if id == "kept" && content == "hello"));
    }

    #[test]
    fn test_delimited_plain_content_is_trimmed() {
        let sections = decode("[[section:abc]]\n  Hello world \n");
        assert_eq!(
            sections,
            vec![Section::Plain {
                id: "abc".to_string(),
                content: "Hello world".to_string(),
            }]
        );
    }

    #[test]
    fn test_delimited_split_section() {
        let raw = "[[section:s1]][[split]] Pros [[split:item]] Cons [[split:pair]] Fast [[split:item]] Slow [[/split]]";
        let sections = decode(raw);
        assert_eq!(
            sections,
            vec![Section::Split {
                id: "s1".to_string(),
                left_title: "Pros".to_string(),
                right_title: "Cons".to_string(),
                left_content: "Fast".to_string(),
                right_content: "Slow".to_string(),
            }]
        );
    }

    #[test]
    fn test_legacy_split_with_surrounding_text() {
        let raw = "Before\n[[split]][[split:title]]Left[[split:content]]one[[split:title]]Right[[split:content]]two[[/split]]\nAfter";
        let sections = decode(raw);

        assert_eq!(sections.len(), 3);
        assert!(matches!(&sections[0], Section::Plain { content, .. } if content == "Before"));
        match &sections[1] {
            Section::Split {
                left_title,
                right_title,
                left_content,
                right_content,
                ..
            } => {
                assert_eq!(
                    (left_title.as_str(), right_title.as_str()),
                    ("Left", "Right")
                );
                assert_eq!(
                    (left_content.as_str(), right_content.as_str()),
                    ("one", "two")
                );
            }
            other => panic!("expected split section, got {:?}", other),
        }
        assert!(matches!(&sections[2], Section::Plain { content, .. } if content == "After"));
    }

    #[test]
    fn test_unrecognized_content_is_wrapped_verbatim() {
        let raw = "  plain notes with no markers\n";
        let sections = decode(raw);
        assert_eq!(sections.len(), 1);
        assert!(matches!(&sections[0], Section::Plain { content, .. } if content == raw));
    }

    #[test]
    fn test_empty_document_decodes_to_one_section() {
        let sections = decode(&encode(&[]));
        assert_eq!(sections.len(), 1);
        assert!(matches!(&sections[0], Section::Plain { content, .. } if content.is_empty()));
    }

    #[test]
    fn test_to_plain_text() {
        let text = to_plain_text(&[
            Section::plain("Intro"),
            Section::plain("   "),
            Section::split("Pros", "Cons", "Fast", "Slow"),
        ]);
        assert_eq!(text, "Intro\nPros: Fast\nCons: Slow");
    }
}
