//! Rewrites speaker-tagged dialogue lines (`[Name] text`) into styled
//! character boxes before markdown rendering.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static SPEAKER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\[(\w+)\][ \t]*(.*)$").expect("valid speaker regex"));

pub const CHARACTER_BOX_CLASS: &str = "character-box";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speaker {
    pub label: String,
    pub color: String,
}

impl Speaker {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTable {
    speakers: HashMap<String, Speaker>,
}

impl Default for SpeakerTable {
    fn default() -> Self {
        let mut speakers = HashMap::new();
        for (key, color) in [
            ("Hya", "red"),
            ("Lina", "blue"),
            ("Vita", "blue"),
            ("Gaukel", "blue"),
        ] {
            speakers.insert(key.to_string(), Speaker::new(key, color));
        }
        Self { speakers }
    }
}

impl SpeakerTable {
    pub fn empty() -> Self {
        Self {
            speakers: HashMap::new(),
        }
    }

    /// Adds or replaces the speaker matched by `[key]`.
    pub fn insert(&mut self, key: impl Into<String>, speaker: Speaker) {
        self.speakers.insert(key.into(), speaker);
    }

    pub fn get(&self, key: &str) -> Option<&Speaker> {
        self.speakers.get(key)
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }
}

/// Replaces every line whose tag names a known speaker. Lines with unknown
/// tags are returned verbatim. Running this twice over its own output is
/// undefined; apply it once per raw chapter text.
pub fn transform(text: &str, speakers: &SpeakerTable) -> String {
    SPEAKER_LINE
        .replace_all(text, |caps: &Captures| {
            let key = &caps[1];
            match speakers.get(key) {
                Some(speaker) => character_box(speaker, caps[2].trim_end_matches('\r')),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn character_box(speaker: &Speaker, dialogue: &str) -> String {
    format!(
        "<fieldset class=\"{CHARACTER_BOX_CLASS} {}\"><legend>{}</legend><p>{}</p></fieldset>",
        speaker.color, speaker.label, dialogue
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_speaker_becomes_character_box() {
        let out = transform("[Hya] Hello", &SpeakerTable::default());
        assert_eq!(
            out,
            "<fieldset class=\"character-box red\"><legend>Hya</legend><p>Hello</p></fieldset>"
        );
    }

    #[test]
    fn unknown_speaker_is_left_verbatim() {
        assert_eq!(transform("[Unknown] Hi", &SpeakerTable::default()), "[Unknown] Hi");
    }

    #[test]
    fn only_tagged_lines_change() {
        let input = "# Chapter 1\n\nNarration.\n[Lina] Where?\n  [Vita]   Here.\nA [Hya] mid-line tag.";
        let out = transform(input, &SpeakerTable::default());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "# Chapter 1");
        assert_eq!(lines[2], "Narration.");
        assert!(lines[3].contains("character-box blue") && lines[3].contains("<p>Where?</p>"));
        assert!(lines[4].contains("<legend>Vita</legend>") && lines[4].contains("<p>Here.</p>"));
        assert_eq!(lines[5], "A [Hya] mid-line tag.");
    }

    #[test]
    fn crlf_line_endings_do_not_leak_into_dialogue() {
        let out = transform("[Gaukel] Move.\r\nNext", &SpeakerTable::default());
        assert!(out.contains("<p>Move.</p>"));
        assert!(out.ends_with("</fieldset>\nNext"));
    }

    #[test]
    fn configured_speakers_override_defaults() {
        let mut table = SpeakerTable::default();
        table.insert("Hya", Speaker::new("Hya the Red", "purple"));
        table.insert("Oru", Speaker::new("Oru", "green"));

        let out = transform("[Hya] a\n[Oru] b", &table);
        assert!(out.contains("character-box purple\"><legend>Hya the Red</legend>"));
        assert!(out.contains("character-box green\"><legend>Oru</legend><p>b</p>"));
    }
}
