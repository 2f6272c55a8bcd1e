use std::path::Path;

use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use tokio::fs;

use crate::{
    error::{ArkangelError, Result},
    provider::ProviderConfig,
    types::VideoAnalysis,
};

/// Uploads whole videos to the moderation service and waits for the verdicts.
#[derive(Debug, Clone)]
pub struct ModerationClient {
    http: Client,
    config: ProviderConfig,
    api_key: String,
}

impl ModerationClient {
    pub fn new(config: ProviderConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            config,
            api_key: api_key.into(),
        })
    }

    /// Upload a video and return the per-second analysis.
    ///
    /// Blocks until the service answers or the configured timeout elapses.
    /// Nothing is retried.
    pub async fn moderate_video(&self, video_path: &Path) -> Result<VideoAnalysis> {
        if !video_path.is_file() {
            return Err(ArkangelError::VideoNotFound {
                path: video_path.to_path_buf(),
            });
        }

        let bytes = fs::read(video_path).await?;
        let file_name = video_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        log::info!(
            "Uploading {} ({} bytes) to {}",
            file_name,
            bytes.len(),
            self.config.video_url
        );

        let form = Form::new()
            .part("file_video", Part::bytes(bytes).file_name(file_name))
            .text("API_KEY", self.api_key.clone())
            .text("task", self.config.tasks.clone());

        let response = self
            .http
            .post(&self.config.video_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ArkangelError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let analysis: VideoAnalysis = serde_json::from_slice(&body)?;

        if analysis.is_failure() {
            return Err(ArkangelError::ModerationFailed {
                reason: analysis.failure_reason(),
            });
        }

        log::debug!(
            "{} returned {} results in {:.1}s",
            self.config.name(),
            analysis.images_results.len(),
            analysis.total_compute_time
        );

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;
    use crate::error::ErrorKind;

    const OK_BODY: &str = r#"{
        "status": "success",
        "final_decision": "KO",
        "images_results": [
            {
                "porn_detection": {"porn_content": false, "confidence_score": 0.99},
                "gore_detection": {"gore_content": false, "confidence_score": 0.99},
                "drug_detection": {"drug_content": false, "confidence_score": 0.99}
            },
            {
                "porn_detection": {"porn_content": true, "confidence_score": 0.91},
                "gore_detection": {"gore_content": false, "confidence_score": 0.99},
                "drug_detection": {"drug_content": false, "confidence_score": 0.99}
            }
        ]
    }"#;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(header_end) = find(buf, b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let body = &buf[header_end + 4..];

        if let Some(len) = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            return body.len() >= len;
        }
        body.ends_with(b"0\r\n\r\n")
    }

    /// Serve a single canned response and hand back the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/analyse_video.php", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 8192];
            while !request_complete(&request) {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    async fn fake_video(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "arkangel-moderation-{}-{}.mp4",
            std::process::id(),
            name
        ));
        fs::write(&path, b"not really an mp4").await.unwrap();
        path
    }

    fn client(url: &str) -> ModerationClient {
        ModerationClient::new(ProviderConfig::default().with_video_url(url), "secret-key").unwrap()
    }

    #[tokio::test]
    async fn uploads_multipart_and_parses_verdicts() {
        let (url, server) = serve_once("200 OK", OK_BODY).await;
        let video = fake_video("ok").await;

        let analysis = client(&url).moderate_video(&video).await.unwrap();
        let verdicts = analysis.verdicts();
        assert_eq!(verdicts.len(), 2);
        assert!(verdicts.get(1).unwrap().porn.flagged);

        let request = String::from_utf8_lossy(&server.await.unwrap()).to_string();
        assert!(request.starts_with("POST /analyse_video.php"));
        assert!(request.contains("multipart/form-data"));
        assert!(request.contains("name=\"file_video\""));
        assert!(request.contains("not really an mp4"));
        assert!(request.contains("name=\"API_KEY\""));
        assert!(request.contains("secret-key"));
        assert!(request.contains("porn_detection,gore_detection,drug_detection"));

        fs::remove_file(video).await.ok();
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let (url, _server) = serve_once("503 Service Unavailable", "{}").await;
        let video = fake_video("503").await;

        let err = client(&url).moderate_video(&video).await.unwrap_err();
        assert!(matches!(err, ArkangelError::UnexpectedStatus { status: 503, .. }));

        fs::remove_file(video).await.ok();
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let (url, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let video = fake_video("html").await;

        let err = client(&url).moderate_video(&video).await.unwrap_err();
        assert!(matches!(err, ArkangelError::JsonError(_)));

        fs::remove_file(video).await.ok();
    }

    #[tokio::test]
    async fn service_failure_payload_is_an_error() {
        let body = r#"{"status": "failure", "error": {"errorCode": 10, "errorMsg": "Invalid API key"}}"#;
        let (url, _server) = serve_once("200 OK", body).await;
        let video = fake_video("failure").await;

        let err = client(&url).moderate_video(&video).await.unwrap_err();
        match err {
            ArkangelError::ModerationFailed { reason } => assert_eq!(reason, "Invalid API key"),
            other => panic!("unexpected error: {other}"),
        }

        fs::remove_file(video).await.ok();
    }

    #[tokio::test]
    async fn silent_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/analyse_video.php", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });
        let video = fake_video("timeout").await;

        let config = ProviderConfig {
            timeout: Duration::from_millis(300),
            ..ProviderConfig::default().with_video_url(url)
        };
        let err = ModerationClient::new(config, "secret-key")
            .unwrap()
            .moderate_video(&video)
            .await
            .unwrap_err();
        match &err {
            ArkangelError::ApiError(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.kind(), ErrorKind::Transport);

        fs::remove_file(video).await.ok();
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/analyse_video.php", listener.local_addr().unwrap());
        drop(listener);
        let video = fake_video("refused").await;

        let err = client(&url).moderate_video(&video).await.unwrap_err();
        assert!(matches!(err, ArkangelError::ApiError(_)));
        assert_eq!(err.kind(), ErrorKind::Transport);

        fs::remove_file(video).await.ok();
    }

    #[tokio::test]
    async fn missing_video_fails_before_upload() {
        let err = client("http://127.0.0.1:9/never")
            .moderate_video(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArkangelError::VideoNotFound { .. }));
    }
}
