pub mod dispatcher;
pub mod ingest;
pub mod normalizer;
pub mod telemetry;
