use std::path::{Path, PathBuf};

use crate::Rejected;

/// Longest playable duration, in seconds, accepted for upload.
pub const MAX_DURATION_SECS: f64 = 180.0;

/// A media file whose measured duration satisfies [`MAX_DURATION_SECS`].
///
/// Only [`validate`] can construct one, so an over-long selection can never
/// reach an upload job.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedMedia {
    path: PathBuf,
    duration_secs: f64,
}

impl ValidatedMedia {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// File name for display; falls back to the full path.
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Gate a selected file on its measured duration.
///
/// Durations that are not finite or are negative are treated as unreadable
/// metadata rather than accepted.
pub fn validate(path: PathBuf, duration_secs: f64) -> Result<ValidatedMedia, Rejected> {
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(Rejected::Unreadable {
            reason: format!("invalid duration {duration_secs}"),
        });
    }
    if duration_secs > MAX_DURATION_SECS {
        return Err(Rejected::TooLong {
            duration_secs,
            limit_secs: MAX_DURATION_SECS,
        });
    }
    Ok(ValidatedMedia {
        path,
        duration_secs,
    })
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_the_limit_is_accepted() {
        let media = validate(PathBuf::from("clip.mp4"), MAX_DURATION_SECS).unwrap();
        assert_eq!(media.path(), Path::new("clip.mp4"));
        assert_eq!(media.display_name(), "clip.mp4");
    }

    #[test]
    fn nan_duration_is_unreadable() {
        let err = validate(PathBuf::from("clip.mp4"), f64::NAN).unwrap_err();
        assert!(matches!(err, Rejected::Unreadable { .. }));
    }
}
