use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    PermissionDenied(String),
    TrackerInit(String),
    CaptureError(String),
    ControlError(String),
    SessionClosed(String),
    InvalidConfig(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanError::PermissionDenied(msg) => write!(f, "Camera permission denied: {}", msg),
            ScanError::TrackerInit(msg) => write!(f, "Pose tracker initialization error: {}", msg),
            ScanError::CaptureError(msg) => write!(f, "Capture error: {}", msg),
            ScanError::ControlError(msg) => write!(f, "Camera control error: {}", msg),
            ScanError::SessionClosed(msg) => write!(f, "Session closed: {}", msg),
            ScanError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::CaptureError("degenerate crop".to_string());
        assert!(err.to_string().contains("Capture error"));
        assert!(err.to_string().contains("degenerate crop"));

        let err = ScanError::SessionClosed("already torn down".to_string());
        assert!(err.to_string().contains("Session closed"));
    }
}
