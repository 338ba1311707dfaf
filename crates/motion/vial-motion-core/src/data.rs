//! Slide deck model and JSON loading.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// One carousel slide. Immutable once handed to a carousel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(alias = "imgSrc")]
    pub image_source: String,
    #[serde(default)]
    pub alt: String,
    /// Optional accent (CSS color string); the carousel default applies otherwise.
    #[serde(default, alias = "accent")]
    pub accent_color: Option<String>,
}

impl Slide {
    pub fn new(id: impl Into<String>, title: impl Into<String>, image_source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: String::new(),
            image_source: image_source.into(),
            alt: String::new(),
            accent_color: None,
        }
    }

    pub fn with_accent(mut self, accent: impl Into<String>) -> Self {
        self.accent_color = Some(accent.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDeck {
    Bare(Vec<Slide>),
    Wrapped { slides: Vec<Slide> },
}

/// Parse a slide deck: either a JSON array of slides or `{ "slides": [...] }`.
/// Slide ids must be unique.
pub fn parse_slide_deck_json(s: &str) -> Result<Vec<Slide>, MotionError> {
    let raw: RawDeck =
        serde_json::from_str(s).map_err(|e| MotionError::SlideDeck(e.to_string()))?;
    let slides = match raw {
        RawDeck::Bare(slides) | RawDeck::Wrapped { slides } => slides,
    };
    check_unique_ids(&slides)?;
    Ok(slides)
}

pub fn check_unique_ids(slides: &[Slide]) -> Result<(), MotionError> {
    let mut seen = HashSet::with_capacity(slides.len());
    for slide in slides {
        if !seen.insert(slide.id.as_str()) {
            return Err(MotionError::DuplicateSlide(slide.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_style_keys() {
        let deck = parse_slide_deck_json(
            r##"[
                { "id": "light", "title": "Ligeros", "imgSrc": "/a.png", "accent": "#E53935" },
                { "id": "moto", "title": "Motos", "subtitle": "s", "imageSource": "/b.png" }
            ]"##,
        )
        .expect("deck should parse");
        assert_eq!(deck.len(), 2);
        assert_eq!(deck[0].image_source, "/a.png");
        assert_eq!(deck[0].accent_color.as_deref(), Some("#E53935"));
        assert_eq!(deck[1].accent_color, None);
        assert_eq!(deck[1].subtitle, "s");
    }

    #[test]
    fn wrapped_deck_and_duplicates() {
        let ok = parse_slide_deck_json(r#"{ "slides": [] }"#).expect("empty deck");
        assert!(ok.is_empty());

        let dup = parse_slide_deck_json(
            r#"[ { "id": "a", "title": "A", "imgSrc": "x" }, { "id": "a", "title": "B", "imgSrc": "y" } ]"#,
        );
        assert_eq!(dup, Err(MotionError::DuplicateSlide("a".into())));
    }

    #[test]
    fn garbage_is_a_deck_error() {
        assert!(matches!(
            parse_slide_deck_json("{\"slides\": 3}"),
            Err(MotionError::SlideDeck(_))
        ));
    }
}
