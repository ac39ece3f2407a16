// The keyboard plan (the front-end resolves keys, the middle layer only ever
// sees InputEvents):
//
// Sound keys, one per built-in sound in table order:
//   1 2 3 4 5 6 7 8 9 0    //  bass1-3, wobble1-3, kick1, kick2, snare1, snare2
//   q w e r t y u i o p    //  clap, hihat1, hihat2, perc1, perc2, crash, synth1-4
//   a s d f g h j k l      //  synth5-7, lead1, lead2, pad1-3, vocal1
//   z x c v b n m          //  vocal2, vocal3, scratch, fx1-4
//
// Transport:
//   Tab                    //  ToggleRecord
//   Enter                  //  PlayRecording
//   Space                  //  Stop
//   Backspace              //  Clear
//   Up / Down              //  VolumeUp / VolumeDown
//   F1..F5                 //  Generate(dubstep / rap / trap / house / afrobeat)
//   F7                     //  PlaySong
//   F8                     //  SaveSong (generated song becomes the take)
//   Esc                    //  Quit

pub const DEFAULT_VOLUME: f32 = 0.7;
pub const VOLUME_STEP: f32 = 0.05;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Trigger(&'static str), // a sound id from the registry

    ToggleRecord,
    PlayRecording,
    Stop,
    Clear,

    VolumeUp,
    VolumeDown,

    Generate(&'static str), // style name
    PlaySong,
    SaveSong,

    Quit,
}

// What the front-end shows; rebuilt from the middle layer every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusLine {
    pub transport: &'static str, // "IDLE", "REC", "PLAY"
    pub volume: f32,
    pub take_len: usize, // notes in the take (or captured so far)
    pub take_secs: f32,
    pub position_secs: Option<f32>, // into the running playback
    pub song: Option<String>, // description of the generated song
    pub message: String, // last thing that happened
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:<4}{}] vol {:>3}% | take {:>4} notes {:>5.1}s | song: {} | {}",
            self.transport,
            self.position_secs.map_or(String::new(), |p| format!(" {p:.1}s")),
            (self.volume * 100.0).round() as u32,
            self.take_len,
            self.take_secs,
            self.song.as_deref().unwrap_or("-"),
            self.message
        )
    }
}
