//! Verse corpus loading for the two supported Bible JSON layouts.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::VerseClockError;

/// A single verse as read from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub book_name: String,
    #[serde(deserialize_with = "deserialize_number")]
    pub chapter: u32,
    #[serde(deserialize_with = "deserialize_number")]
    pub verse: u32,
    pub text: String,
}

impl VerseRecord {
    pub fn new(
        book_name: impl Into<String>,
        chapter: u32,
        verse: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            book_name: book_name.into(),
            chapter,
            verse,
            text: text.into(),
        }
    }
}

/// Input layout selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    /// `[ {book_name, chapter, verse, text}, ... ]`, optionally wrapped as
    /// `{ "metadata": {...}, "verses": [...] }` (biblesupersearch.com downloads).
    Flat,
    /// `{ "Genesis": { "1": { "1": "text" } } }` (jadenzaleski/BibleTranslations).
    Nested,
}

impl CorpusFormat {
    pub const TAGS: &'static [&'static str] =
        &["flat", "nested", "biblesupersearch", "jadenzaleski"];

    pub fn tag(&self) -> &'static str {
        match self {
            CorpusFormat::Flat => "flat",
            CorpusFormat::Nested => "nested",
        }
    }
}

impl fmt::Display for CorpusFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CorpusFormat {
    type Err = VerseClockError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flat" | "biblesupersearch" => Ok(CorpusFormat::Flat),
            "nested" | "jadenzaleski" => Ok(CorpusFormat::Nested),
            other => Err(VerseClockError::configuration(format!(
                "unknown corpus format '{other}' (expected one of: {})",
                CorpusFormat::TAGS.join(", ")
            ))),
        }
    }
}

/// Read and parse a corpus file.
pub fn read_corpus(
    path: &Path,
    format: CorpusFormat,
) -> Result<Vec<VerseRecord>, VerseClockError> {
    let raw = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&raw).map_err(|err| {
        VerseClockError::parse(format!("{} is not valid JSON: {err}", path.display()))
    })?;
    let verses = load_corpus(document, format)?;
    info!(
        path = %path.display(),
        format = %format,
        verses = verses.len(),
        "Loaded verse corpus"
    );
    Ok(verses)
}

/// Normalize an already-parsed JSON document into a flat verse list.
pub fn load_corpus(
    document: Value,
    format: CorpusFormat,
) -> Result<Vec<VerseRecord>, VerseClockError> {
    match format {
        CorpusFormat::Flat => load_flat(document),
        CorpusFormat::Nested => load_nested(document),
    }
}

fn load_flat(document: Value) -> Result<Vec<VerseRecord>, VerseClockError> {
    let list = match document {
        Value::Array(_) => document,
        Value::Object(mut map) => map.remove("verses").ok_or_else(|| {
            VerseClockError::parse("flat corpus object has no 'verses' array")
        })?,
        _ => {
            return Err(VerseClockError::parse(
                "flat corpus must be a verse array or an object with a 'verses' array",
            ));
        }
    };
    if !list.is_array() {
        return Err(VerseClockError::parse("flat corpus 'verses' is not an array"));
    }
    serde_json::from_value(list)
        .map_err(|err| VerseClockError::parse(format!("invalid verse record: {err}")))
}

fn load_nested(document: Value) -> Result<Vec<VerseRecord>, VerseClockError> {
    let Value::Object(books) = document else {
        return Err(VerseClockError::parse(
            "nested corpus must be an object keyed by book name",
        ));
    };

    let mut verses = Vec::new();
    for (book_name, chapters) in books {
        let chapters = expect_object(&chapters, || format!("book '{book_name}'"))?;
        for (chapter_key, verse_map) in chapters {
            let chapter = parse_key(chapter_key).ok_or_else(|| {
                VerseClockError::parse(format!(
                    "book '{book_name}' has non-numeric chapter key '{chapter_key}'"
                ))
            })?;
            let verse_map =
                expect_object(verse_map, || format!("book '{book_name}' chapter {chapter}"))?;
            for (verse_key, text) in verse_map {
                let verse = parse_key(verse_key).ok_or_else(|| {
                    VerseClockError::parse(format!(
                        "book '{book_name}' chapter {chapter} has non-numeric verse key '{verse_key}'"
                    ))
                })?;
                let text = text.as_str().ok_or_else(|| {
                    VerseClockError::parse(format!(
                        "book '{book_name}' {chapter}:{verse} text is not a string"
                    ))
                })?;
                verses.push(VerseRecord::new(book_name.as_str(), chapter, verse, text));
            }
        }
    }
    Ok(verses)
}

fn expect_object<'a>(
    value: &'a Value,
    describe: impl FnOnce() -> String,
) -> Result<&'a Map<String, Value>, VerseClockError> {
    value
        .as_object()
        .ok_or_else(|| VerseClockError::parse(format!("{} is not a JSON object", describe())))
}

fn parse_key(key: &str) -> Option<u32> {
    key.trim().parse().ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => u32::try_from(n).map_err(de::Error::custom),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a number, found '{s}'"))),
    }
}
