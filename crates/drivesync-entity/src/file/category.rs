//! File categories used by the `category(name)` view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse content class derived from a file's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileCategory {
    /// `image/*`.
    Images,
    /// PDFs, office documents, and text.
    Documents,
    /// `video/*`.
    Videos,
    /// `audio/*`.
    Audio,
    /// Anything else.
    Others,
}

impl FileCategory {
    /// Classify a MIME type.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        let (top, sub) = mime.split_once('/').unwrap_or((mime.as_str(), ""));
        match top {
            "image" => Self::Images,
            "video" => Self::Videos,
            "audio" => Self::Audio,
            "text" => Self::Documents,
            "application"
                if sub == "pdf"
                    || sub == "msword"
                    || sub == "rtf"
                    || sub.starts_with("vnd.openxmlformats-officedocument")
                    || sub.starts_with("vnd.ms-")
                    || sub.starts_with("vnd.oasis.opendocument") =>
            {
                Self::Documents
            }
            _ => Self::Others,
        }
    }

    /// Display name, as shown in the sidebar.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Images => "Images",
            Self::Documents => "Documents",
            Self::Videos => "Videos",
            Self::Audio => "Audio",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Images,
            Self::Documents,
            Self::Videos,
            Self::Audio,
            Self::Others,
        ]
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown file category '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime() {
        assert_eq!(FileCategory::from_mime("image/jpeg"), FileCategory::Images);
        assert_eq!(FileCategory::from_mime("application/pdf"), FileCategory::Documents);
        assert_eq!(
            FileCategory::from_mime(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            FileCategory::Documents
        );
        assert_eq!(FileCategory::from_mime("VIDEO/MP4"), FileCategory::Videos);
        assert_eq!(FileCategory::from_mime("application/zip"), FileCategory::Others);
        assert_eq!(FileCategory::from_mime(""), FileCategory::Others);
    }

    #[test]
    fn test_parse_display_name() {
        assert_eq!("images".parse::<FileCategory>(), Ok(FileCategory::Images));
        assert_eq!(FileCategory::Audio.to_string(), "Audio");
    }
}
