// Where song outlines come from. The composer doesn't care: anything that
// can hand over a SongStructure for a style name will do, and when it can't,
// the built-in presets stand in.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::song::{Section, SongStructure, StructureError};

pub const STYLES: [&str; 5] = ["dubstep", "rap", "trap", "house", "afrobeat"];

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("outline unavailable: {0}")]
    Unavailable(String),
    #[error("could not read outline: {0}")]
    Io(#[from] std::io::Error),
    #[error("no JSON object in response")]
    NoJson,
    #[error("outline is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed outline: {0}")]
    Malformed(#[from] StructureError),
}

pub trait SongOutlineProvider {
    fn provide(&self, style: &str) -> Result<SongStructure, OutlineError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutlineSource {
    Provider,
    Fallback,
}

// Asks `provider` first; any failure (including a structure that doesn't
// validate) falls back to the preset for `style`.
pub fn acquire_outline(provider: &dyn SongOutlineProvider, style: &str) -> (SongStructure, OutlineSource) {
    match provider.provide(style).and_then(|s| {
        s.validate()?;
        Ok(s)
    }) {
        Ok(s) => (s, OutlineSource::Provider),
        Err(e) => {
            tracing::warn!(style, error = %e, "outline provider failed, using fallback");
            (fallback_structure(style), OutlineSource::Fallback)
        }
    }
}

// The built-in presets as a provider; never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackTable;

impl SongOutlineProvider for FallbackTable {
    fn provide(&self, style: &str) -> Result<SongStructure, OutlineError> {
        Ok(fallback_structure(style))
    }
}

// Reads `<dir>/<style>.json`, e.g. a reply saved from a text service.
#[derive(Clone, Debug)]
pub struct FileOutlineProvider {
    dir: PathBuf,
}

impl FileOutlineProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, style: &str) -> Result<PathBuf, OutlineError> {
        // a style is a name, not a path
        let name = Path::new(style);
        if style.is_empty() || name.components().count() != 1 || name.extension().is_some() {
            return Err(OutlineError::Unavailable(format!("not a style name: {style:?}")));
        }
        Ok(self.dir.join(format!("{style}.json")))
    }
}

impl SongOutlineProvider for FileOutlineProvider {
    fn provide(&self, style: &str) -> Result<SongStructure, OutlineError> {
        let path = self.path_for(style)?;
        let text = std::fs::read_to_string(&path)?;
        tracing::debug!(path = %path.display(), "outline file read");
        parse_outline(&text)
    }
}

// Pulls the outermost {...} out of free text (text services like to wrap
// their JSON in prose or code fences) and checks it is usable.
pub fn parse_outline(text: &str) -> Result<SongStructure, OutlineError> {
    let start = text.find('{').ok_or(OutlineError::NoJson)?;
    let end = text.rfind('}').ok_or(OutlineError::NoJson)?;
    if end < start {
        return Err(OutlineError::NoJson);
    }
    let structure: SongStructure = serde_json::from_str(&text[start..=end])?;
    structure.validate()?;
    Ok(structure)
}

fn style_description(style: &str) -> &str {
    match style {
        "dubstep" => "aggressive dubstep with heavy bass drops, wobbles, and intense energy",
        "rap" => "hard-hitting rap beat with strong kicks and snares",
        "trap" => "modern trap beat with hi-hat rolls and 808s",
        "house" => "energetic house music with four-on-the-floor kick pattern",
        "afrobeat" => "rhythmic afrobeats with percussion and melodic patterns",
        other => other,
    }
}

// The request sent to a text service for an outline of `style`.
pub fn build_prompt(style: &str) -> String {
    let description = style_description(style);
    format!(
        r#"You are a professional music producer. Create a detailed song structure for {description}.
Provide the following in JSON format:
{{
  "bpm": <number between 120-150>,
  "description": "<brief description of the song>",
  "sections": [
    {{
      "name": "<intro/verse/buildup/drop/outro>",
      "duration": <beats, e.g., 16 or 32>,
      "elements": ["<instrument1>", "<instrument2>"]
    }}
  ]
}}
Use these available instruments: kick, snare, hihat, bass, wobble, synth, pad, fx
Make it a complete song with intro, verses, buildups, drops, and outro.
Return ONLY the JSON, no other text."#
    )
}

fn preset(bpm: u32, description: &str, sections: &[(&str, u32, &[&str])]) -> SongStructure {
    SongStructure {
        bpm,
        description: description.to_string(),
        sections: sections
            .iter()
            .map(|(name, beats, elements)| Section::new(name, *beats, elements))
            .collect(),
    }
}

// Preset outline per style; unknown styles get dubstep.
pub fn fallback_structure(style: &str) -> SongStructure {
    match style {
        "rap" => preset(
            90,
            "Classic rap beat with hard-hitting drums",
            &[
                ("intro", 8, &["hihat"]),
                ("verse", 32, &["kick", "snare", "hihat"]),
                ("chorus", 16, &["kick", "snare", "hihat", "synth"]),
                ("verse2", 32, &["kick", "snare", "hihat", "bass"]),
                ("chorus2", 16, &["kick", "snare", "hihat", "synth"]),
                ("outro", 8, &["hihat", "pad"]),
            ],
        ),
        "trap" => preset(
            140,
            "Modern trap with hi-hat rolls and 808s",
            &[
                ("intro", 16, &["hihat"]),
                ("verse", 32, &["kick", "snare", "hihat", "bass"]),
                ("chorus", 32, &["kick", "snare", "hihat", "synth", "bass"]),
                ("verse2", 32, &["kick", "snare", "hihat", "bass"]),
                ("outro", 16, &["hihat", "pad"]),
            ],
        ),
        "house" => preset(
            128,
            "Energetic house music with four-on-the-floor",
            &[
                ("intro", 16, &["kick", "hihat"]),
                ("buildup", 16, &["kick", "hihat", "synth", "fx"]),
                ("drop", 32, &["kick", "hihat", "bass", "synth"]),
                ("breakdown", 16, &["pad", "synth"]),
                ("drop2", 32, &["kick", "hihat", "bass", "synth"]),
                ("outro", 16, &["kick", "hihat"]),
            ],
        ),
        "afrobeat" => preset(
            110,
            "Rhythmic afrobeats with percussive elements",
            &[
                ("intro", 8, &["perc", "hihat"]),
                ("verse", 32, &["kick", "snare", "perc", "hihat", "synth"]),
                ("chorus", 32, &["kick", "snare", "perc", "hihat", "synth", "bass"]),
                ("verse2", 32, &["kick", "snare", "perc", "hihat", "pad"]),
                ("outro", 16, &["perc", "pad"]),
            ],
        ),
        _ => preset(
            140,
            "Heavy dubstep with aggressive drops and wobbles",
            &[
                ("intro", 16, &["hihat", "pad"]),
                ("buildup", 16, &["kick", "snare", "fx"]),
                ("drop", 32, &["kick", "snare", "wobble", "bass"]),
                ("breakdown", 16, &["pad", "synth"]),
                ("drop2", 32, &["kick", "snare", "wobble", "bass"]),
                ("outro", 16, &["pad", "hihat"]),
            ],
        ),
    }
}
