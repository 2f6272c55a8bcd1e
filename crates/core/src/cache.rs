use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::{
    error::{ArkangelError, Result},
    types::VideoAnalysis,
};

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("arkangel")
}

/// Get the cache directory for a given video file
pub fn get_cache_dir(video_path: &Path) -> PathBuf {
    cache_dir_under(&get_root_cache_dir(), video_path)
}

/// Keyed by the canonical path and the file size, so a replaced file is re-analyzed.
pub fn cache_dir_under(root: &Path, video_path: &Path) -> PathBuf {
    let canonical = video_path
        .canonicalize()
        .unwrap_or_else(|_| video_path.to_path_buf());
    let size = std::fs::metadata(&canonical).map(|m| m.len()).unwrap_or(0);

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    size.hash(&mut hasher);

    root.join(hasher.finish().to_string())
}

/// Get the path for a cached analysis file
pub fn get_analysis_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("analysis.json")
}

/// Load an analysis from a cached file. A file that does not parse, such as
/// one left half-written by an interrupted run, is `CacheCorrupt`.
pub async fn load_analysis(path: &Path) -> Result<VideoAnalysis> {
    let json_content = fs::read_to_string(path).await?;
    serde_json::from_str(&json_content).map_err(|e| ArkangelError::CacheCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Save an analysis to a file, creating its directory if needed
pub async fn save_analysis(analysis: &VideoAnalysis, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(analysis)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
