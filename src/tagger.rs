use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::Result;

use crate::hierarchy::HierarchyParser;
use crate::locate::{LocateMethod, LocatorConfig, SectionLocator};
use crate::markers::{MarkerParser, end_marker, start_marker};
use crate::model::SectionDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSection {
    pub section: SectionDescriptor,
    pub start: usize,
    pub end: usize,
    pub method: LocateMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagDiagnostic {
    Unlocated {
        id: String,
        title: String,
        cue: String,
    },
    DuplicateId {
        id: String,
        document_order: usize,
    },
    Collapsed {
        id: String,
        title: String,
        offset: usize,
    },
}

impl fmt::Display for TagDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocated { id, title, cue } => {
                write!(f, "section {id} ({title}) not found; cue: {cue:?}")
            }
            Self::DuplicateId { id, document_order } => {
                write!(f, "section {id} repeated at outline line {document_order}; kept first")
            }
            Self::Collapsed { id, title, offset } => {
                write!(f, "section {id} ({title}) has an empty span at offset {offset}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaggedDocument {
    pub text: String,
    pub sections: Vec<LocatedSection>,
    pub diagnostics: Vec<TagDiagnostic>,
}

pub struct SectionTagger {
    parser: HierarchyParser,
    config: LocatorConfig,
}

impl SectionTagger {
    pub fn new(config: LocatorConfig) -> Result<Self> {
        Ok(Self {
            parser: HierarchyParser::new()?,
            config,
        })
    }

    pub fn parse_outline(&self, outline_markdown: &str) -> Vec<SectionDescriptor> {
        self.parser.parse(outline_markdown)
    }

    pub fn tag(&self, sections: &[SectionDescriptor], raw_text: &str) -> TaggedDocument {
        tag_sections(sections, raw_text, self.config)
    }
}

pub fn tag_sections(
    sections: &[SectionDescriptor],
    raw_text: &str,
    config: LocatorConfig,
) -> TaggedDocument {
    let mut diagnostics = Vec::<TagDiagnostic>::new();
    if sections.is_empty() {
        return TaggedDocument {
            text: raw_text.to_string(),
            sections: Vec::new(),
            diagnostics,
        };
    }

    let locator = SectionLocator::new(raw_text, config);
    let mut seen = HashSet::<&str>::new();
    let mut found = Vec::<(SectionDescriptor, usize, LocateMethod)>::new();

    for section in sections {
        if !seen.insert(section.id.as_str()) {
            diagnostics.push(TagDiagnostic::DuplicateId {
                id: section.id.clone(),
                document_order: section.document_order,
            });
            continue;
        }

        match locator.locate_section(section) {
            Some(hit) => found.push((section.clone(), hit.offset, hit.method)),
            None => diagnostics.push(TagDiagnostic::Unlocated {
                id: section.id.clone(),
                title: section.title.clone(),
                cue: section.cue.clone(),
            }),
        }
    }

    found.sort_by_key(|(section, start, _)| (*start, section.document_order));

    let spans = found
        .iter()
        .map(|(section, start, _)| (section.level, *start))
        .collect::<Vec<_>>();
    let ends = compute_section_ends(&spans, raw_text.len());

    let mut located = Vec::<LocatedSection>::with_capacity(found.len());
    for ((section, start, method), end) in found.into_iter().zip(ends) {
        if start >= end {
            diagnostics.push(TagDiagnostic::Collapsed {
                id: section.id.clone(),
                title: section.title.clone(),
                offset: start,
            });
            continue;
        }
        located.push(LocatedSection {
            section,
            start,
            end,
            method,
        });
    }

    TaggedDocument {
        text: apply_markers(raw_text, &located),
        sections: located,
        diagnostics,
    }
}

// `spans` are `(level, start)` sorted by start. A section ends where the next
// section of the same or a higher level (smaller number) starts, otherwise at
// `document_len`.
pub fn compute_section_ends(spans: &[(u8, usize)], document_len: usize) -> Vec<usize> {
    spans
        .iter()
        .enumerate()
        .map(|(index, (level, _))| {
            spans[index + 1..]
                .iter()
                .find(|(next_level, _)| next_level <= level)
                .map(|(_, next_start)| *next_start)
                .unwrap_or(document_len)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MarkerKind {
    End,
    Start,
}

// Inserts markers working from the end of the document backwards, so every
// insertion lands at an offset of the original text. At a shared offset the
// textual order is: closing markers (innermost first), then opening markers
// (outermost first). `sections` must be sorted by start.
fn apply_markers(raw_text: &str, sections: &[LocatedSection]) -> String {
    let mut events = Vec::<(usize, MarkerKind, usize, String)>::with_capacity(sections.len() * 2);
    for (rank, located) in sections.iter().enumerate() {
        let LocatedSection {
            section,
            start,
            end,
            ..
        } = located;
        events.push((
            *end,
            MarkerKind::End,
            sections.len() - rank,
            format!(" {}", end_marker(&section.id, &section.title)),
        ));
        events.push((
            *start,
            MarkerKind::Start,
            rank,
            format!("{} ", start_marker(&section.id, &section.title)),
        ));
    }
    events.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let mut pieces = Vec::<&str>::with_capacity(events.len() * 2 + 1);
    let mut cursor = raw_text.len();
    for (offset, _, _, marker) in events.iter().rev() {
        pieces.push(&raw_text[*offset..cursor]);
        pieces.push(marker);
        cursor = *offset;
    }
    pieces.push(&raw_text[..cursor]);
    pieces.reverse();

    pieces.concat()
}

pub fn smallest_chunks(
    markers: &MarkerParser,
    tagged_text: &str,
    sections: &[SectionDescriptor],
) -> BTreeMap<String, String> {
    let mut chunks = BTreeMap::<String, String>::new();

    for (index, section) in sections.iter().enumerate() {
        let is_leaf = sections
            .get(index + 1)
            .is_none_or(|next| next.level <= section.level);
        if is_leaf {
            chunks.insert(
                section.id.clone(),
                markers.extract_section_text(&section.id, tagged_text),
            );
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger() -> SectionTagger {
        SectionTagger::new(LocatorConfig::default()).expect("tagger should build")
    }

    fn tag_outline(outline: &str, raw: &str) -> TaggedDocument {
        let tagger = tagger();
        tagger.tag(&tagger.parse_outline(outline), raw)
    }

    const RAW: &str = "CHAPTER I\nGeneral provisions apply to everyone here.\nArticle 1\nSubject matter is defined in this article.\nArticle 2\nMaterial scope covers automated processing.\nCHAPTER II\nPrinciples follow in the next articles.";

    const OUTLINE: &str = "# CHAPTER I {#h1}\n\"General provisions apply to everyone here\"\n## Article 1 {#h2}\n\"Subject matter is defined in this article\"\n## Article 2 {#h3}\n\"Material scope covers automated processing\"\n# CHAPTER II {#h4}\n\"Principles follow in the next articles\"\n";

    #[test]
    fn computes_ends_from_hierarchy() {
        let spans = vec![(1, 0), (2, 10), (3, 15), (2, 20), (1, 40)];
        assert_eq!(compute_section_ends(&spans, 50), vec![40, 20, 20, 40, 50]);
    }

    #[test]
    fn last_section_ends_at_document_length() {
        let document = tag_outline(OUTLINE, RAW);

        let last = document.sections.last().expect("sections located");
        assert_eq!(last.section.id, "h4");
        assert_eq!(last.end, RAW.len());
        let chapter_one = &document.sections[0];
        assert_eq!(chapter_one.end, RAW.find("CHAPTER II").expect("fixture"));
    }

    #[test]
    fn sections_start_at_their_headings() {
        let document = tag_outline(OUTLINE, RAW);

        let starts = document
            .sections
            .iter()
            .map(|located| (located.section.id.as_str(), located.start))
            .collect::<Vec<_>>();
        assert_eq!(
            starts,
            vec![
                ("h1", 0),
                ("h2", RAW.find("Article 1").expect("fixture")),
                ("h3", RAW.find("Article 2").expect("fixture")),
                ("h4", RAW.find("CHAPTER II").expect("fixture")),
            ]
        );
        assert!(document.diagnostics.is_empty());
    }

    #[test]
    fn ancestors_contain_descendants() {
        let document = tag_outline(OUTLINE, RAW);
        let by_id = |id: &str| {
            document
                .sections
                .iter()
                .find(|located| located.section.id == id)
                .expect("section located")
        };

        for (parent, child) in [("h1", "h2"), ("h1", "h3")] {
            let parent = by_id(parent);
            let child = by_id(child);
            assert!(parent.start <= child.start);
            assert!(child.start < child.end);
            assert!(child.end <= parent.end);
        }
    }

    #[test]
    fn tagged_text_round_trips_through_marker_parser() {
        let document = tag_outline(OUTLINE, RAW);
        let markers = MarkerParser::new().expect("marker regex");

        let parsed = markers
            .parse_tagged_text(&document.text)
            .expect("markers should be balanced");
        assert_eq!(parsed.len(), 4);

        for located in &document.sections {
            let text = markers.extract_section_text(&located.section.id, &document.text);
            assert!(!text.is_empty(), "{} should have text", located.section.id);
        }

        assert_eq!(
            markers.extract_section_text("h2", &document.text),
            "Article 1\nSubject matter is defined in this article."
        );
        assert!(document.text.ends_with(
            "Principles follow in the next articles. [END SECTION h4: CHAPTER II]"
        ));
    }

    #[test]
    fn parent_end_marker_lands_after_children() {
        let document = tag_outline(OUTLINE, RAW);

        let child_end = document
            .text
            .find("[END SECTION h3: Article 2]")
            .expect("child end marker");
        let parent_end = document
            .text
            .find("[END SECTION h1: CHAPTER I]")
            .expect("parent end marker");
        let next_start = document
            .text
            .find("[START SECTION h4: CHAPTER II]")
            .expect("next start marker");

        assert!(child_end < parent_end);
        assert!(parent_end < next_start);
    }

    #[test]
    fn shared_offsets_nest_outer_around_inner() {
        let raw = "Title line then body text of the document.";
        let outline = "# Part {#p}\n\"Title line then body\"\n## Chapter {#c}\n\"Title line then body\"\n";
        let document = tag_outline(outline, raw);

        assert_eq!(
            document.text,
            "[START SECTION p: Part] [START SECTION c: Chapter] Title line then body text of the document. [END SECTION c: Chapter] [END SECTION p: Part]"
        );
    }

    #[test]
    fn unlocated_and_duplicate_sections_are_reported() {
        let outline = "# CHAPTER I {#h1}\n\"General provisions apply\"\n# Ghost {#h9}\n\"zebra quantum\"\n# CHAPTER I {#h1}\n";
        let document = tag_outline(outline, RAW);

        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.sections[0].end, RAW.len());
        assert_eq!(
            document.diagnostics,
            vec![
                TagDiagnostic::Unlocated {
                    id: "h9".to_string(),
                    title: "Ghost".to_string(),
                    cue: "zebra quantum".to_string(),
                },
                TagDiagnostic::DuplicateId {
                    id: "h1".to_string(),
                    document_order: 4,
                },
            ]
        );
    }

    #[test]
    fn same_level_sections_at_one_offset_collapse_the_first() {
        let raw = "Shared heading text and more words.";
        let outline = "# A {#a}\n\"Shared heading text\"\n# B {#b}\n\"Shared heading text\"\n";
        let document = tag_outline(outline, raw);

        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.sections[0].section.id, "b");
        assert!(matches!(
            document.diagnostics.as_slice(),
            [TagDiagnostic::Collapsed { id, offset: 0, .. }] if id == "a"
        ));
    }

    #[test]
    fn empty_outline_returns_raw_text() {
        let document = tag_outline("no headings here", RAW);
        assert_eq!(document.text, RAW);
        assert!(document.sections.is_empty());
    }

    #[test]
    fn smallest_chunks_keep_only_leaves() {
        let tagger = tagger();
        let sections = tagger.parse_outline(OUTLINE);
        let document = tagger.tag(&sections, RAW);
        let markers = MarkerParser::new().expect("marker regex");
        let chunks = smallest_chunks(&markers, &document.text, &sections);

        let ids = chunks.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(ids, vec!["h2", "h3", "h4"]);
        assert_eq!(
            chunks.get("h3").map(String::as_str),
            Some("Article 2\nMaterial scope covers automated processing.")
        );
    }

    #[test]
    fn anchors_with_spaces_are_tagged_and_recovered() {
        let raw = "Intro\nThe opening words of this document begin here.\nScope\nThe scope words of this document follow next.";
        let outline = "# Intro {#sec one}\n\"The opening words of this document begin here\"\n# Scope {#h2}\n\"The scope words of this document follow next\"\n";

        let document = tag_outline(outline, raw);
        let markers = MarkerParser::new().expect("marker regex");

        assert_eq!(document.sections.len(), 2);
        let parsed = markers
            .parse_tagged_text(&document.text)
            .expect("markers should nest");
        let ids = parsed.iter().map(|s| s.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["sec one", "h2"]);
        assert_eq!(
            markers.extract_section_text("sec one", &document.text),
            "Intro\nThe opening words of this document begin here."
        );
        assert_eq!(
            markers.extract_section_text("h2", &document.text),
            "Scope\nThe scope words of this document follow next."
        );
    }
}
