//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while setting up the analysis chain
///
/// All of these are configuration errors raised at session start. Nothing in
/// the per-frame path returns an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid frame size: {0} (must be a power of two between 16 and 65536)")]
    InvalidFrameSize(usize),

    #[error("Magnitude floor must be a positive normal number, got {0}")]
    InvalidMagnitudeFloor(f32),

    #[error("Magnitude scale must be positive and finite, got {0}")]
    InvalidMagnitudeScale(f32),

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("Window gain must be positive, got {0}")]
    InvalidWindowGain(f32),
}

/// Check that `frame_size` is a power of two within the supported range
pub fn validate_frame_size(frame_size: usize) -> Result<(), DspError> {
    if !frame_size.is_power_of_two()
        || !(crate::MIN_FRAME_SIZE..=crate::MAX_FRAME_SIZE).contains(&frame_size)
    {
        return Err(DspError::InvalidFrameSize(frame_size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DspError::InvalidFrameSize(1000);
        assert!(err.to_string().contains("1000"));

        let err = DspError::InvalidSampleRate(-1.0);
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_validate_frame_size() {
        assert!(validate_frame_size(1024).is_ok());
        assert!(validate_frame_size(4096).is_ok());
        assert!(validate_frame_size(crate::MIN_FRAME_SIZE).is_ok());
        assert!(validate_frame_size(crate::MAX_FRAME_SIZE).is_ok());

        assert_eq!(validate_frame_size(1000), Err(DspError::InvalidFrameSize(1000)));
        assert!(validate_frame_size(0).is_err());
        assert!(validate_frame_size(1).is_err());
        assert!(validate_frame_size(crate::MAX_FRAME_SIZE * 2).is_err());
    }
}
