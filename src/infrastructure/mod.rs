pub mod storage;
pub mod transcription;
