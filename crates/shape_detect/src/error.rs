use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("Invalid input image: {0}")]
    InvalidInput(String),

    #[error("Degenerate line (rho={rho}, theta={theta}) cannot be clipped to the frame")]
    DegenerateLine { rho: f32, theta: f32 },

    #[error("No shape detected")]
    NoShapeDetected,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ShapeError {
    /// Whether the run can continue after this error (the failing item is skipped).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateLine { .. })
    }
}

pub type Result<T> = std::result::Result<T, ShapeError>;
