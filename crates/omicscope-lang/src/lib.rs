//! omicscope-lang - language services around the chat: answer translation
//! and voice-question transcription.

pub mod audio;
pub mod speech;
pub mod translate;

pub use audio::WavClip;
pub use speech::{GoogleSpeechTranscriber, Transcriber, TranscriptionError, VoiceInput};
pub use translate::{translate, GoogleTranslator, TranslateError, Translator};
