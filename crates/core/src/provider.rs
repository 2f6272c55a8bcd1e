use std::time::Duration;

use crate::{
    error::{ArkangelError, Result},
    verdict::Category,
};

pub const DEFAULT_VIDEO_URL: &str = "https://www.picpurify.com/analyse_video.php";
pub const API_KEY_ENV_VAR: &str = "picpurify_key";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(240);

/// Where and how the video is sent for moderation.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub video_url: String,
    pub env_var: &'static str,
    pub tasks: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            video_url: DEFAULT_VIDEO_URL.to_string(),
            env_var: API_KEY_ENV_VAR,
            tasks: Category::PRIORITY
                .iter()
                .map(Category::task)
                .collect::<Vec<_>>()
                .join(","),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = url.into();
        self
    }

    pub fn name(&self) -> &'static str {
        "PicPurify"
    }

    /// Validate that the API key is set
    pub fn validate_api_key(&self) -> Result<String> {
        match std::env::var(self.env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ArkangelError::MissingApiKey {
                env_var: self.env_var.to_string(),
            }),
        }
    }
}
