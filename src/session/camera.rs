//! Camera control seam.
//!
//! The host shell owns the actual device and feeds frames into the session;
//! this trait only carries constraint changes outward. Unsupported requests
//! are soft failures: the session logs and continues, per the external
//! camera contract.

use crate::errors::ScanError;
use crate::types::CameraFacing;

pub trait CameraControl: Send {
    fn set_facing(&mut self, facing: CameraFacing) -> Result<(), ScanError>;
    fn set_zoom(&mut self, factor: f32) -> Result<(), ScanError>;
    fn set_torch(&mut self, on: bool) -> Result<(), ScanError>;
    /// Brightness/contrast adjustments applied to the active track.
    fn set_adjustments(&mut self, brightness: f32, contrast: f32) -> Result<(), ScanError>;
    /// Release the stream. Called exactly once at teardown.
    fn stop(&mut self) -> Result<(), ScanError>;
}

/// Accepts every request and does nothing. Test double and default.
#[derive(Debug, Default)]
pub struct NullCamera;

impl CameraControl for NullCamera {
    fn set_facing(&mut self, _facing: CameraFacing) -> Result<(), ScanError> {
        Ok(())
    }

    fn set_zoom(&mut self, _factor: f32) -> Result<(), ScanError> {
        Ok(())
    }

    fn set_torch(&mut self, _on: bool) -> Result<(), ScanError> {
        Ok(())
    }

    fn set_adjustments(&mut self, _brightness: f32, _contrast: f32) -> Result<(), ScanError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ScanError> {
        Ok(())
    }
}
