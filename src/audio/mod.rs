//! Audio I/O bridging (WAV only; compressed codecs are external)

pub mod wav;

pub use wav::{load_wav, save_wav};
