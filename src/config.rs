//! Configuration for the capture pipeline.
//!
//! Every empirically-tuned constant in the guidance flow lives here: hold
//! durations, quality minimums, macro band edges and increments, countdown
//! length, and the capture-time scoring knees. Values ship with UX-tuned
//! defaults and can be overridden from a TOML file.

use crate::errors::ScanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub analysis: AnalysisConfig,
    pub pose: PoseConfig,
    pub guidance: GuidanceConfig,
    pub capture: CaptureConfig,
}

/// Frame sampling and quality-analysis cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Target width of the downsampled analysis buffer (pixels)
    pub analysis_width: u32,
    /// Pixel stride when sampling a region for brightness/sharpness
    pub sample_stride: u32,
    /// Default analysis region as a fraction of the shorter frame dimension
    pub region_fraction: f32,
    /// Multiplier applied to the mean luma gradient before clamping to [0,100]
    pub sharpness_scale: f32,
    /// Texture-analysis tick interval (ms), ~2 Hz
    pub texture_interval_ms: u64,
}

/// Pose estimation geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseConfig {
    /// Scale from normalized nose offset to a degree-like yaw range
    pub yaw_scale_deg: f32,
    /// Scale from normalized nose offset to a degree-like pitch range
    pub pitch_scale_deg: f32,
    /// Baseline subtracted from raw pitch; camera framing is not level by default
    pub pitch_baseline_deg: f32,
}

/// Guidance state machine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceConfig {
    /// Hold-to-confirm dwell for pose steps (seconds)
    pub hold_duration_s: f32,
    /// Minimum sharpness for a focus-lock tick to pass (0-100)
    pub focus_min_sharpness: f32,
    /// Minimum brightness for a focus-lock tick to pass (0-255 luma)
    pub focus_min_brightness: f32,
    /// Consecutive passing texture ticks before the countdown starts
    pub focus_dwell_ticks: u32,
    /// Countdown length before focus-lock and manual shots (seconds)
    pub countdown_steps: u32,
    /// Macro band: below this sharpness the shot is too blurry
    pub macro_blurry_max: f32,
    /// Macro band: at or above this sharpness the framing is good
    pub macro_good_min: f32,
    /// Progress added per borderline macro tick
    pub macro_align_increment: f32,
    /// Progress added per good macro tick; must be < 100 so a cold start
    /// cannot complete in one tick
    pub macro_hold_increment: f32,
}

/// Capture-time transform and scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Eye-band blur height as a fraction of measured face height
    pub eye_band_height_factor: f32,
    /// Eye-band blur width as a fraction of measured face width
    pub eye_band_width_factor: f32,
    /// Extra padding around the eye band (native pixels)
    pub eye_band_padding_px: u32,
    /// Box blur radius for the privacy band (pixels)
    pub blur_radius: u32,
    /// Brightness below this is penalized as under-exposed
    pub low_brightness_knee: f32,
    /// Brightness above this is penalized as over-exposed
    pub high_brightness_knee: f32,
    /// JPEG encoding quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig {
                analysis_width: 160,
                sample_stride: 2,
                region_fraction: 0.5,
                sharpness_scale: 4.0,
                texture_interval_ms: 500,
            },
            pose: PoseConfig {
                yaw_scale_deg: 90.0,
                pitch_scale_deg: 90.0,
                pitch_baseline_deg: 22.5,
            },
            guidance: GuidanceConfig {
                hold_duration_s: 1.2,
                focus_min_sharpness: 55.0,
                focus_min_brightness: 60.0,
                focus_dwell_ticks: 2,
                countdown_steps: 3,
                macro_blurry_max: 30.0,
                macro_good_min: 55.0,
                macro_align_increment: 8.0,
                macro_hold_increment: 34.0,
            },
            capture: CaptureConfig {
                eye_band_height_factor: 0.35,
                eye_band_width_factor: 1.25,
                eye_band_padding_px: 6,
                blur_radius: 6,
                low_brightness_knee: 60.0,
                high_brightness_knee: 200.0,
                jpeg_quality: 90,
            },
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScanError::InvalidConfig(format!("Failed to read config file: {}", e)))?;

        let config: ScanConfig = toml::from_str(&contents)
            .map_err(|e| ScanError::InvalidConfig(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScanError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ScanError::InvalidConfig(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ScanError::InvalidConfig(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ScanError::InvalidConfig(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("scanguide.toml")
    }

    /// Load from default location or create with defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.analysis.analysis_width < 16 {
            return Err(ScanError::InvalidConfig(
                "analysis_width must be at least 16".to_string(),
            ));
        }
        if self.analysis.sample_stride == 0 {
            return Err(ScanError::InvalidConfig(
                "sample_stride must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.analysis.region_fraction) {
            return Err(ScanError::InvalidConfig(
                "region_fraction must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.guidance.hold_duration_s <= 0.0 {
            return Err(ScanError::InvalidConfig(
                "hold_duration_s must be positive".to_string(),
            ));
        }
        if self.guidance.focus_dwell_ticks == 0 {
            return Err(ScanError::InvalidConfig(
                "focus_dwell_ticks must be at least 1".to_string(),
            ));
        }
        if self.guidance.macro_blurry_max >= self.guidance.macro_good_min {
            return Err(ScanError::InvalidConfig(
                "macro_blurry_max must be below macro_good_min".to_string(),
            ));
        }
        if self.guidance.macro_hold_increment <= 0.0 || self.guidance.macro_hold_increment >= 100.0
        {
            return Err(ScanError::InvalidConfig(
                "macro_hold_increment must be in (0, 100)".to_string(),
            ));
        }
        if self.guidance.macro_align_increment < 0.0 {
            return Err(ScanError::InvalidConfig(
                "macro_align_increment must not be negative".to_string(),
            ));
        }

        if self.capture.low_brightness_knee >= self.capture.high_brightness_knee {
            return Err(ScanError::InvalidConfig(
                "low_brightness_knee must be below high_brightness_knee".to_string(),
            ));
        }
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(ScanError::InvalidConfig(
                "jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}
