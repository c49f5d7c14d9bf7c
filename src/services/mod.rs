pub mod aggregator;
pub mod batch;
pub mod retrieval;
pub mod storage;
pub mod transcription;
pub mod worker_pool;
