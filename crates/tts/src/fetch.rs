use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use reqwest::Client;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{Result, TtsError};

const STAGED_PREFIX: &str = "voxworker-prompt-";
const DEFAULT_SUFFIX: &str = ".wav";

/// Reference clip downloaded to local scratch storage
///
/// The file is deleted when this value is dropped, which covers early
/// returns and cancelled requests. [`StagedAudio::release`] deletes it
/// eagerly and reports failures.
#[derive(Debug)]
pub struct StagedAudio {
    path: TempPath,
}

impl StagedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file now
    pub fn release(self) {
        let display = self.path.display().to_string();

        match self.path.close() {
            Ok(()) => tracing::debug!(path = %display, "released staged reference audio"),
            Err(e) => tracing::warn!(path = %display, "failed to delete staged reference audio: {e}"),
        }
    }
}

/// Downloads reference audio into uniquely named scratch files
pub struct AudioFetcher {
    client: Client,
    scratch_dir: PathBuf,
    max_bytes: u64,
}

impl AudioFetcher {
    pub const fn new(client: Client, scratch_dir: PathBuf, max_bytes: u64) -> Self {
        Self {
            client,
            scratch_dir,
            max_bytes,
        }
    }

    /// Stage the clip at `url`, or do nothing when there is no URL
    ///
    /// A single attempt is made. Any failure leaves no file behind.
    pub async fn fetch(&self, url: Option<&Url>) -> Result<Option<StagedAudio>> {
        match url {
            Some(url) => self.download(url).await.map(Some),
            None => Ok(None),
        }
    }

    async fn download(&self, url: &Url) -> Result<StagedAudio> {
        tracing::debug!(host = url.host_str().unwrap_or_default(), "fetching reference audio");

        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            tracing::error!("reference audio request failed: {e}");
            TtsError::Fetch(describe(&e))
        })?;

        let status = response.status();

        if !status.is_success() {
            tracing::error!("reference audio host returned {status}");
            return Err(TtsError::Fetch(format!("reference audio request returned {status}")));
        }

        if let Some(length) = response.content_length()
            && length > self.max_bytes
        {
            return Err(self.too_large());
        }

        let (file, path) = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(&suffix_for(url))
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| {
                tracing::error!("failed to create scratch file in {}: {e}", self.scratch_dir.display());
                TtsError::Fetch(format!("failed to create scratch file: {e}"))
            })?
            .into_parts();

        // Owned from here on so that every early return deletes the file
        let staged = StagedAudio { path };
        let mut file = tokio::fs::File::from_std(file);
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TtsError::Fetch(describe(&e)))?
        {
            written += chunk.len() as u64;

            if written > self.max_bytes {
                return Err(self.too_large());
            }

            file.write_all(&chunk)
                .await
                .map_err(|e| TtsError::Fetch(format!("failed to write scratch file: {e}")))?;
        }

        if written == 0 {
            return Err(TtsError::Fetch("reference audio response body was empty".to_string()));
        }

        file.flush()
            .await
            .map_err(|e| TtsError::Fetch(format!("failed to write scratch file: {e}")))?;

        tracing::debug!(bytes = written, path = %staged.path().display(), "staged reference audio");

        Ok(staged)
    }

    fn too_large(&self) -> TtsError {
        TtsError::Fetch(format!("reference audio exceeds the {} byte limit", self.max_bytes))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("could not connect: {error}")
    } else {
        error.to_string()
    }
}

/// Scratch file suffix taken from the URL path, `.wav` when absent or odd
fn suffix_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| Path::new(name).extension())
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| DEFAULT_SUFFIX.to_string(), |ext| format!(".{}", ext.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher(dir: &Path, max_bytes: u64) -> AudioFetcher {
        let client = Client::builder().timeout(Duration::from_millis(500)).build().unwrap();
        AudioFetcher::new(client, dir.to_path_buf(), max_bytes)
    }

    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn no_url_stages_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let staged = fetcher(dir.path(), 1024).fetch(None).await.unwrap();

        assert!(staged.is_none());
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn stages_body_and_releases_it() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/voices/narrator.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF-voice-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/voices/narrator.mp3", server.uri())).unwrap();

        let staged = fetcher(dir.path(), 1024).fetch(Some(&url)).await.unwrap().unwrap();

        assert!(staged.path().starts_with(dir.path()));
        assert_eq!(staged.path().extension().and_then(OsStr::to_str), Some("mp3"));
        assert!(
            staged
                .path()
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap()
                .starts_with(STAGED_PREFIX)
        );
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"RIFF-voice-bytes");

        staged.release();
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn drop_deletes_staged_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8; 64]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/clip", server.uri())).unwrap();

        let staged = fetcher(dir.path(), 1024).fetch(Some(&url)).await.unwrap().unwrap();
        assert_eq!(staged_files(dir.path()), 1);

        drop(staged);
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/missing.wav", server.uri())).unwrap();

        let err = fetcher(dir.path(), 1024).fetch(Some(&url)).await.unwrap_err();

        assert!(matches!(err, TtsError::Fetch(ref message) if message.contains("404")));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn empty_body_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/empty.wav", server.uri())).unwrap();

        let err = fetcher(dir.path(), 1024).fetch(Some(&url)).await.unwrap_err();

        assert!(matches!(err, TtsError::Fetch(ref message) if message.contains("empty")));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn oversized_body_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 4096]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/huge.wav", server.uri())).unwrap();

        let err = fetcher(dir.path(), 1024).fetch(Some(&url)).await.unwrap_err();

        assert!(matches!(err, TtsError::Fetch(ref message) if message.contains("1024 byte limit")));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn slow_host_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1_u8; 16])
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("{}/slow.wav", server.uri())).unwrap();

        let err = fetcher(dir.path(), 1024).fetch(Some(&url)).await.unwrap_err();

        assert!(matches!(err, TtsError::Fetch(ref message) if message.contains("timed out")));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn unreachable_host_is_fetch_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(&format!("http://{addr}/clip.wav")).unwrap();

        let err = fetcher(dir.path(), 1024).fetch(Some(&url)).await.unwrap_err();

        assert!(matches!(err, TtsError::Fetch(_)));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[test]
    fn suffix_follows_url_extension() {
        let suffix = |raw: &str| suffix_for(&Url::parse(raw).unwrap());

        assert_eq!(suffix("https://cdn.example.com/a/voice.FLAC?sig=1"), ".flac");
        assert_eq!(suffix("https://cdn.example.com/a/voice"), ".wav");
        assert_eq!(suffix("https://cdn.example.com/"), ".wav");
        assert_eq!(suffix("https://cdn.example.com/a/voice.tar%20gz"), ".wav");
        assert_eq!(suffix("https://cdn.example.com/a/voice.toolongext"), ".wav");
    }
}
