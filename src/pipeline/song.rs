use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::note::NoteEvent;

/// A song outline: tempo plus ordered sections tagged with instruments.
/// Says nothing about individual notes; the composer fills those in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongStructure {
    pub bpm: u32,
    #[serde(default)]
    pub description: String,
    pub sections: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    #[serde(alias = "duration")] // what text services tend to answer with
    pub duration_beats: u32,
    pub elements: Vec<String>, // instrument tags: kick, snare, hihat, ...
}

impl Section {
    pub fn new(name: &str, duration_beats: u32, elements: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            duration_beats,
            elements: elements.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("bpm must be positive")]
    ZeroBpm,
    #[error("no sections")]
    NoSections,
    #[error("section '{0}' has no beats")]
    EmptySection(String),
}

impl SongStructure {
    // A structure the composer can expand: positive tempo, at least one
    // section, and no zero-length sections. Returns what is wrong otherwise.
    pub fn validate(&self) -> Result<(), StructureError> {
        if self.bpm == 0 {
            return Err(StructureError::ZeroBpm);
        }
        if self.sections.is_empty() {
            return Err(StructureError::NoSections);
        }
        if let Some(s) = self.sections.iter().find(|s| s.duration_beats == 0) {
            return Err(StructureError::EmptySection(s.name.clone()));
        }
        Ok(())
    }

    pub fn total_beats(&self) -> u64 {
        self.sections.iter().map(|s| s.duration_beats as u64).sum()
    }
}

/// The concrete, time-sorted note list derived from a [`SongStructure`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSong {
    pub bpm: u32,
    pub description: String,
    pub notes: Vec<NoteEvent>,
    pub total_duration_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_duration_alias() {
        let json = r#"{"bpm":128,"sections":[{"name":"intro","duration":16,"elements":["kick","hihat"]}]}"#;
        let s: SongStructure = serde_json::from_str(json).unwrap();
        assert_eq!(s.description, "");
        assert_eq!(s.sections[0], Section::new("intro", 16, &["kick", "hihat"]));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_empty_or_zero_length() {
        let mut s = SongStructure {
            bpm: 120,
            description: String::new(),
            sections: vec![],
        };
        assert_eq!(s.validate(), Err(StructureError::NoSections));
        s.sections.push(Section::new("verse", 0, &["kick"]));
        assert_eq!(s.validate(), Err(StructureError::EmptySection("verse".into())));
        assert_eq!(s.validate().unwrap_err().to_string(), "section 'verse' has no beats");
        s.sections[0].duration_beats = 8;
        s.bpm = 0;
        assert_eq!(s.validate(), Err(StructureError::ZeroBpm));
    }

    #[test]
    fn total_beats_sums_sections() {
        let s = SongStructure {
            bpm: 90,
            description: "x".into(),
            sections: vec![Section::new("a", 8, &[]), Section::new("b", 32, &[])],
        };
        assert_eq!(s.total_beats(), 40);
    }
}
