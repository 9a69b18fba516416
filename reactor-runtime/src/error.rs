#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error("telemetry: {0}")]
    Telemetry(String),
}
