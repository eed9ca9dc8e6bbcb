//! HuggingFace model downloader
//!
//! Fetches GGUF files from the HuggingFace Hub into the models directory.

use crate::types::model::GgufSource;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid HuggingFace URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid model filename: {0}")]
    InvalidFilename(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Download failed with status: {0}")]
    Status(reqwest::StatusCode),
    #[error("Could not determine file size")]
    UnknownSize,
    #[error("Download incomplete: got {downloaded} bytes, expected {expected}")]
    Incomplete { downloaded: u64, expected: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse a HuggingFace URL to extract model info
#[derive(Debug, Clone)]
pub struct HuggingFaceUrl {
    pub repo_id: String,
    pub filename: String,
    pub revision: String,
}

fn sanitize_local_filename(filename: &str) -> Result<String, DownloadError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(DownloadError::InvalidFilename(filename.to_string()));
    }

    let no_leading = trimmed.trim_start_matches('/');
    let flattened = no_leading.replace('\\', "/").replace('/', "__");

    let mut sanitized = String::with_capacity(flattened.len());
    for ch in flattened.chars() {
        let invalid = matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*');
        if invalid || ch.is_control() {
            sanitized.push('_');
        } else {
            sanitized.push(ch);
        }
    }

    while sanitized.ends_with('.') || sanitized.ends_with(' ') {
        sanitized.pop();
    }

    if sanitized.is_empty() {
        return Err(DownloadError::InvalidFilename(filename.to_string()));
    }

    Ok(sanitized)
}

impl HuggingFaceUrl {
    /// Parse various HuggingFace URL formats
    pub fn parse(url: &str) -> Result<Self, DownloadError> {
        // Accepted forms:
        // 1. https://huggingface.co/owner/repo/blob/main/model.gguf
        // 2. https://huggingface.co/owner/repo/resolve/main/model.gguf
        // 3. owner/repo/model.gguf
        // 4. owner/repo

        let url = url.trim();
        let url = url.split('?').next().unwrap_or(url);
        let url = url.split('#').next().unwrap_or(url);

        if url.contains("huggingface.co") {
            let path = url
                .replace("https://huggingface.co/", "")
                .replace("http://huggingface.co/", "");

            let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
            if parts.len() < 2 {
                return Err(DownloadError::InvalidUrl(url.to_string()));
            }

            let repo_id = format!("{}/{}", parts[0], parts[1]);

            if let Some(marker) = parts.iter().position(|&p| p == "blob" || p == "resolve") {
                if parts.len() > marker + 2 {
                    return Ok(Self {
                        repo_id,
                        filename: parts[marker + 2..].join("/"),
                        revision: parts[marker + 1].to_string(),
                    });
                }
            }

            return Ok(Self {
                repo_id,
                filename: String::new(),
                revision: "main".to_string(),
            });
        }

        let parts: Vec<&str> = url.split('/').filter(|p| !p.is_empty()).collect();
        if parts.len() >= 2 {
            return Ok(Self {
                repo_id: format!("{}/{}", parts[0], parts[1]),
                filename: parts[2..].join("/"),
                revision: "main".to_string(),
            });
        }

        Err(DownloadError::InvalidUrl(url.to_string()))
    }
}

/// Build the download URL for a GGUF source
pub fn download_url(source: &GgufSource) -> String {
    format!(
        "https://huggingface.co/{}/resolve/{}/{}",
        source.repo_id, source.revision, source.filename
    )
}

/// Local path a source is stored at inside `models_dir`
pub fn local_path(source: &GgufSource, models_dir: &Path) -> Result<PathBuf, DownloadError> {
    Ok(models_dir.join(sanitize_local_filename(&source.filename)?))
}

/// Download a GGUF file unless a non-empty copy already exists
pub async fn download_model(
    source: &GgufSource,
    models_dir: &Path,
    progress_callback: impl Fn(u64, u64) + Send + 'static,
) -> Result<PathBuf, DownloadError> {
    let output_path = local_path(source, models_dir)?;

    if output_path.exists() && fs::metadata(&output_path)?.len() > 0 {
        tracing::info!("Model already present: {:?}", output_path);
        return Ok(output_path);
    }

    fs::create_dir_all(models_dir)?;
    let mut temp_name = output_path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let url = download_url(source);
    tracing::info!("Downloading from: {}", url);
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(3600)) // large models take a while
        .build()?;

    let mut response = client
        .get(&url)
        .header("User-Agent", concat!("duochat/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let total_size = response.content_length().ok_or(DownloadError::UnknownSize)?;
    tracing::info!("File size: {}", format_size(total_size));

    let body = async {
        let mut temp_file = File::create(&temp_path).await?;
        let mut downloaded: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            temp_file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress_callback(downloaded, total_size);
        }
        temp_file.flush().await?;

        if downloaded != total_size {
            return Err(DownloadError::Incomplete {
                downloaded,
                expected: total_size,
            });
        }
        Ok(())
    };

    persist_download(&temp_path, &output_path, body).await?;
    tracing::info!("Download complete: {:?}", output_path);

    Ok(output_path)
}

/// Move the finished temp file into place, or delete it when `body` failed
async fn persist_download(
    temp_path: &Path,
    output_path: &Path,
    body: impl Future<Output = Result<(), DownloadError>>,
) -> Result<(), DownloadError> {
    let written = match body.await {
        Ok(()) => fs::rename(temp_path, output_path).map_err(DownloadError::from),
        Err(e) => Err(e),
    };
    if written.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(temp_path) {
            tracing::warn!("Could not remove partial download {:?}: {}", temp_path, e);
        }
    }
    written
}

/// Get a human-readable size string
pub fn format_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes < 1024.0 {
        format!("{} B", bytes as u64)
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.2} KB", bytes / 1024.0)
    } else if bytes < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hf_url_full() {
        let url = "https://huggingface.co/bartowski/gemma-2-2b-jpn-it-GGUF/blob/main/gemma-2-2b-jpn-it-Q4_K_M.gguf";
        let parsed = HuggingFaceUrl::parse(url).unwrap();
        assert_eq!(parsed.repo_id, "bartowski/gemma-2-2b-jpn-it-GGUF");
        assert_eq!(parsed.filename, "gemma-2-2b-jpn-it-Q4_K_M.gguf");
        assert_eq!(parsed.revision, "main");
    }

    #[test]
    fn test_parse_hf_url_short() {
        let url = "mmnga/sarashina2.2-1b-instruct-v0.1-gguf/sarashina2.2-1b-instruct-v0.1-Q8_0.gguf";
        let parsed = HuggingFaceUrl::parse(url).unwrap();
        assert_eq!(parsed.repo_id, "mmnga/sarashina2.2-1b-instruct-v0.1-gguf");
        assert_eq!(parsed.filename, "sarashina2.2-1b-instruct-v0.1-Q8_0.gguf");
    }

    #[test]
    fn test_parse_hf_url_repo_only() {
        let parsed = HuggingFaceUrl::parse("bartowski/gemma-2-2b-jpn-it-GGUF").unwrap();
        assert_eq!(parsed.repo_id, "bartowski/gemma-2-2b-jpn-it-GGUF");
        assert_eq!(parsed.filename, "");
    }

    #[test]
    fn test_parse_hf_url_invalid() {
        assert!(HuggingFaceUrl::parse("just-a-name").is_err());
    }

    #[test]
    fn test_download_url() {
        let source = GgufSource::new("owner/repo", "model.gguf");
        assert_eq!(
            download_url(&source),
            "https://huggingface.co/owner/repo/resolve/main/model.gguf"
        );
    }

    #[test]
    fn test_local_path_flattens_subdirectories() {
        let source = GgufSource::new("owner/repo", "quant/model:v1.gguf");
        let path = local_path(&source, Path::new("/models")).unwrap();
        assert_eq!(path, Path::new("/models/quant__model_v1.gguf"));
    }

    #[tokio::test]
    async fn test_existing_file_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let source = GgufSource::new("owner/repo", "present.gguf");
        fs::write(dir.path().join("present.gguf"), b"GGUF").unwrap();

        let path = download_model(&source, dir.path(), |_, _| {}).await.unwrap();
        assert_eq!(path, dir.path().join("present.gguf"));
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("model.gguf.tmp");
        let output_path = dir.path().join("model.gguf");

        let body = async {
            fs::write(&temp_path, b"GG")?;
            Err(DownloadError::Incomplete {
                downloaded: 2,
                expected: 4,
            })
        };
        let result = persist_download(&temp_path, &output_path, body).await;

        assert!(matches!(result, Err(DownloadError::Incomplete { .. })));
        assert!(!temp_path.exists());
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn test_finished_download_is_moved_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("model.gguf.tmp");
        let output_path = dir.path().join("model.gguf");

        let body = async {
            fs::write(&temp_path, b"GGUF")?;
            Ok(())
        };
        persist_download(&temp_path, &output_path, body).await.unwrap();

        assert!(!temp_path.exists());
        assert_eq!(fs::read(&output_path).unwrap(), b"GGUF");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
