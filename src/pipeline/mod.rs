// Everything between a key press (or a song outline) and the synth:
// note lists, recording/playback timing, and the procedural composer.

pub mod composer;
pub mod note;
pub mod outline;
pub mod scheduler;
pub mod song;
pub mod timer;

pub use composer::compose;
pub use note::{NoteEvent, Recording};
pub use outline::{acquire_outline, FallbackTable};
pub use scheduler::{NoteScheduler, TransportError, TransportStatus};
pub use song::GeneratedSong;
