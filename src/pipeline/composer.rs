// Expands a song outline into concrete notes. Each instrument element has a
// pool of sounds and a placement rule on the section's local beat grid; the
// only randomness is which pool member plays (and how many synth notes), and
// it all comes from the rng the caller passes in.

use rand::seq::SliceRandom;
use rand::Rng;

use super::note::NoteEvent;
use super::song::{GeneratedSong, Section, SongStructure};

pub fn beat_duration_ms(bpm: u32) -> f64 {
    60000.0 / bpm as f64
}

// candidate sounds per element; unknown elements get a single "<name>1"
pub fn element_pool(element: &str) -> Vec<String> {
    let pool: &[&str] = match element {
        "kick" => &["kick1", "kick2"],
        "snare" => &["snare1", "snare2"],
        "hihat" => &["hihat1", "hihat2"],
        "bass" => &["bass1", "bass2", "bass3"],
        "wobble" => &["wobble1", "wobble2", "wobble3"],
        "synth" => &["synth1", "synth2", "synth3", "synth4", "synth5", "synth6", "synth7"],
        "pad" => &["pad1", "pad2", "pad3"],
        "perc" => &["perc1", "perc2"],
        "fx" => &["fx1", "fx2", "fx3", "fx4"],
        other => return vec![format!("{other}1")],
    };
    pool.iter().map(|s| s.to_string()).collect()
}

pub fn compose<R: Rng + ?Sized>(structure: &SongStructure, rng: &mut R) -> GeneratedSong {
    // an unvalidated outline with bpm 0 is composed as 1 bpm
    let beat_ms = beat_duration_ms(structure.bpm.max(1));

    let mut notes = Vec::new();
    let mut cursor_ms = 0.0;
    for section in &structure.sections {
        place_section(section, beat_ms, cursor_ms, rng, &mut notes);
        cursor_ms += section.duration_beats as f64 * beat_ms;
    }

    // stable, so equal offsets keep element order
    notes.sort_by(|a, b| a.offset_ms.total_cmp(&b.offset_ms));

    tracing::debug!(
        bpm = structure.bpm,
        sections = structure.sections.len(),
        notes = notes.len(),
        total_ms = cursor_ms,
        "song composed"
    );

    GeneratedSong {
        bpm: structure.bpm,
        description: structure.description.clone(),
        notes,
        total_duration_ms: cursor_ms,
    }
}

fn place_section<R: Rng + ?Sized>(
    section: &Section,
    beat_ms: f64,
    start_ms: f64,
    rng: &mut R,
    notes: &mut Vec<NoteEvent>,
) {
    let beats = section.duration_beats as usize;
    let mut seen: Vec<&str> = Vec::with_capacity(section.elements.len());

    for element in &section.elements {
        // elements are a set; a repeated tag doesn't double the part
        if seen.contains(&element.as_str()) {
            continue;
        }
        seen.push(element.as_str());

        let pool = element_pool(element);
        let mut emit = |sound: &str, beat: f64| {
            notes.push(NoteEvent::new(sound, start_ms + beat * beat_ms));
        };
        let pick = |rng: &mut R| pool.choose(rng).cloned().unwrap_or_default();

        match element.as_str() {
            // downbeat and backbeat of every bar
            "kick" => {
                for i in (0..beats).step_by(4) {
                    emit(&pool[0], i as f64);
                    if i + 2 < beats {
                        emit(&pool[0], (i + 2) as f64);
                    }
                }
            }
            "snare" => {
                for i in (1..beats).step_by(2) {
                    emit(&pick(&mut *rng), i as f64);
                }
            }
            // eighth notes, alternating the two hats
            "hihat" => {
                for i in 0..beats * 2 {
                    emit(&pool[i % pool.len()], i as f64 * 0.5);
                }
            }
            "bass" | "wobble" => {
                for i in (0..beats).step_by(2) {
                    emit(&pick(&mut *rng), i as f64);
                }
            }
            "synth" => {
                for i in (0..beats).step_by(4) {
                    let count = rng.gen_range(1..=3);
                    for j in 0..count {
                        emit(&pick(&mut *rng), i as f64 + 0.5 * j as f64);
                    }
                }
            }
            "pad" => {
                for i in (0..beats).step_by(8) {
                    emit(&pick(&mut *rng), i as f64);
                }
            }
            "perc" => {
                for i in (0..beats).step_by(3) {
                    emit(&pick(&mut *rng), i as f64);
                }
            }
            "fx" => emit(&pick(&mut *rng), 0.0),
            _ => {} // pool fallback only, nothing to place
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn outline(bpm: u32, sections: Vec<Section>) -> SongStructure {
        SongStructure { bpm, description: "test".into(), sections }
    }

    fn beats(song: &GeneratedSong, bpm: u32) -> Vec<f64> {
        let beat = beat_duration_ms(bpm);
        song.notes.iter().map(|n| n.offset_ms / beat).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn beat_duration_is_exact() {
        for bpm in 60..=200 {
            assert_eq!(beat_duration_ms(bpm), 60000.0 / bpm as f64);
        }
        assert_eq!(beat_duration_ms(120), 500.0);
    }

    #[test]
    fn kick_lands_on_one_and_three() {
        let mut rng = StdRng::seed_from_u64(0);
        let song = compose(&outline(120, vec![Section::new("v", 4, &["kick"])]), &mut rng);
        assert_eq!(beats(&song, 120), vec![0.0, 2.0]);
        assert!(song.notes.iter().all(|n| n.sound_id == "kick1"));
    }

    #[test]
    fn kick_skips_backbeat_past_section_end() {
        let mut rng = StdRng::seed_from_u64(0);
        let song = compose(&outline(120, vec![Section::new("v", 6, &["kick"])]), &mut rng);
        assert_eq!(beats(&song, 120), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn hihat_plays_eighths_alternating() {
        let mut rng = StdRng::seed_from_u64(0);
        let song = compose(&outline(100, vec![Section::new("v", 4, &["hihat"])]), &mut rng);
        assert_eq!(beats(&song, 100).len(), 8);
        for (i, (note, b)) in song.notes.iter().zip(beats(&song, 100)).enumerate() {
            assert!(close(b, i as f64 * 0.5));
            let want = if i % 2 == 0 { "hihat1" } else { "hihat2" };
            assert_eq!(note.sound_id, want);
        }
    }

    #[test]
    fn snare_on_odd_beats_from_pool() {
        let mut rng = StdRng::seed_from_u64(5);
        let song = compose(&outline(120, vec![Section::new("v", 8, &["snare"])]), &mut rng);
        assert_eq!(beats(&song, 120), vec![1.0, 3.0, 5.0, 7.0]);
        let pool = element_pool("snare");
        assert!(song.notes.iter().all(|n| pool.contains(&n.sound_id)));
    }

    fn from_pool(song: &GeneratedSong, element: &str) -> bool {
        let pool = element_pool(element);
        song.notes.iter().all(|n| pool.contains(&n.sound_id))
    }

    #[test]
    fn sparse_elements() {
        let mut rng = StdRng::seed_from_u64(5);
        let song = compose(&outline(120, vec![Section::new("v", 16, &["pad"])]), &mut rng);
        assert_eq!(beats(&song, 120), vec![0.0, 8.0]);
        assert!(from_pool(&song, "pad"));
        let song = compose(&outline(120, vec![Section::new("v", 16, &["perc"])]), &mut rng);
        assert_eq!(beats(&song, 120), vec![0.0, 3.0, 6.0, 9.0, 12.0, 15.0]);
        assert!(from_pool(&song, "perc"));
        let song = compose(&outline(120, vec![Section::new("v", 16, &["fx"])]), &mut rng);
        assert_eq!(beats(&song, 120), vec![0.0]);
        assert!(from_pool(&song, "fx"));
        let song = compose(&outline(120, vec![Section::new("v", 5, &["wobble"])]), &mut rng);
        assert_eq!(beats(&song, 120), vec![0.0, 2.0, 4.0]);
        assert!(from_pool(&song, "wobble"));
    }

    #[test]
    fn bass_on_even_beats_from_pool() {
        let mut rng = StdRng::seed_from_u64(8);
        let song = compose(&outline(140, vec![Section::new("v", 8, &["bass"])]), &mut rng);
        assert_eq!(beats(&song, 140).len(), 4);
        for (b, want) in beats(&song, 140).into_iter().zip([0.0, 2.0, 4.0, 6.0]) {
            assert!(close(b, want), "beat {b}");
        }
        assert!(from_pool(&song, "bass"));
    }

    #[test]
    fn zero_bpm_composes_at_one_bpm() {
        let mut rng = StdRng::seed_from_u64(0);
        let song = compose(&outline(0, vec![Section::new("v", 4, &["kick"])]), &mut rng);
        assert_eq!(song.total_duration_ms, 4.0 * 60000.0);
        assert_eq!(song.notes.len(), 2);
        assert_eq!(song.notes[1].offset_ms, 2.0 * 60000.0);
    }

    #[test]
    fn synth_plays_one_to_three_per_bar() {
        let mut rng = StdRng::seed_from_u64(11);
        let song = compose(&outline(120, vec![Section::new("v", 32, &["synth"])]), &mut rng);
        let pool = element_pool("synth");
        assert!((8..=24).contains(&song.notes.len()));
        for (note, b) in song.notes.iter().zip(beats(&song, 120)) {
            assert!(pool.contains(&note.sound_id));
            let within_bar = b % 4.0;
            assert!([0.0, 0.5, 1.0].iter().any(|&x| close(within_bar, x)), "beat {b}");
        }
    }

    #[test]
    fn unknown_elements_place_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let song = compose(&outline(120, vec![Section::new("v", 8, &["cowbell", "kick"])]), &mut rng);
        assert_eq!(element_pool("cowbell"), vec!["cowbell1".to_string()]);
        assert!(song.notes.iter().all(|n| n.sound_id == "kick1"));
    }

    #[test]
    fn repeated_tags_count_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let song = compose(&outline(120, vec![Section::new("v", 4, &["kick", "kick"])]), &mut rng);
        assert_eq!(song.notes.len(), 2);
    }

    #[test]
    fn sections_advance_the_cursor_and_notes_are_sorted() {
        let mut rng = StdRng::seed_from_u64(2);
        let s = outline(
            140,
            vec![
                Section::new("intro", 16, &["hihat", "pad"]),
                Section::new("drop", 32, &["kick", "snare", "wobble", "bass", "fx"]),
                Section::new("outro", 8, &["synth", "perc"]),
            ],
        );
        let song = compose(&s, &mut rng);
        let beat = beat_duration_ms(140);
        assert!(close(song.total_duration_ms, 56.0 * beat));
        assert!(song.notes.windows(2).all(|w| w[0].offset_ms <= w[1].offset_ms));
        // drop starts with kick, wobble, bass and fx together at beat 16
        let at_16 = song.notes.iter().filter(|n| close(n.offset_ms, 16.0 * beat)).count();
        assert_eq!(at_16, 4);
        assert!(song.notes.iter().all(|n| n.offset_ms < song.total_duration_ms));
    }

    #[test]
    fn ties_keep_element_order() {
        let mut rng = StdRng::seed_from_u64(2);
        let song = compose(&outline(120, vec![Section::new("v", 4, &["hihat", "kick"])]), &mut rng);
        assert_eq!(song.notes[0].sound_id, "hihat1");
        assert_eq!(song.notes[1].sound_id, "kick1");
    }

    #[test]
    fn same_seed_same_song() {
        let s = outline(
            128,
            vec![Section::new("a", 16, &["kick", "synth", "bass"]), Section::new("b", 8, &["fx", "pad"])],
        );
        let a = compose(&s, &mut StdRng::seed_from_u64(42));
        let b = compose(&s, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn bpm_90_verse_scenario() {
        let mut rng = StdRng::seed_from_u64(0);
        let song = compose(&outline(90, vec![Section::new("verse", 4, &["kick"])]), &mut rng);
        assert!((beat_duration_ms(90) - 666.67).abs() < 0.01);
        assert_eq!(song.notes.len(), 2);
        assert_eq!(song.notes[0].offset_ms, 0.0);
        assert!((song.notes[1].offset_ms - 1333.33).abs() < 0.01);
        assert!((song.total_duration_ms - 2666.67).abs() < 0.01);
        assert!(element_pool("kick").contains(&song.notes[0].sound_id));
    }
}
