/// Errors from asset loading and sprite preparation.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("asset not loaded: {0}")]
    MissingAsset(String),
    #[error("crop rectangle lies outside {path}")]
    EmptyCrop { path: String },
    #[error("some assets failed to load: {failed:?}")]
    BatchFailed { failed: Vec<String> },
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl AssetError {
    /// Path of the asset this error concerns, if it concerns a single one.
    pub fn path(&self) -> Option<&str> {
        match self {
            AssetError::Fetch { path, .. }
            | AssetError::Decode { path, .. }
            | AssetError::EmptyCrop { path } => Some(path),
            AssetError::MissingAsset(path) => Some(path),
            AssetError::BatchFailed { .. } | AssetError::Manifest(_) => None,
        }
    }
}
