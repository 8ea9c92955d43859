pub mod alert;
pub mod category;
pub mod telemetry;
pub mod upstream;
