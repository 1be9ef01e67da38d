//! Mock speech model server for integration tests
//!
//! Answers `POST /generate` with a short WAV tone and serves reference clips
//! under `/voices/{name}` so one server covers both collaborators.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Router, routing};
use tokio_util::sync::CancellationToken;

pub const SAMPLE_RATE: u32 = 24_000;

/// Mock model server with request counters
pub struct MockModel {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockModelState>,
}

struct MockModelState {
    generate_count: AtomicU32,
    prompted_count: AtomicU32,
    voice_count: AtomicU32,
    fail: bool,
}

impl MockModel {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(false).await
    }

    /// Start a mock server whose `/generate` always answers 500
    pub async fn start_failing() -> anyhow::Result<Self> {
        Self::start_inner(true).await
    }

    async fn start_inner(fail: bool) -> anyhow::Result<Self> {
        let state = Arc::new(MockModelState {
            generate_count: AtomicU32::new(0),
            prompted_count: AtomicU32::new(0),
            voice_count: AtomicU32::new(0),
            fail,
        });

        let app = Router::new()
            .route("/generate", routing::post(handle_generate))
            .route("/voices/{name}", routing::get(handle_voice))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    stop.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of a reference clip hosted by this server
    pub fn voice_url(&self, name: &str) -> String {
        format!("http://{}/voices/{name}", self.addr)
    }

    /// Number of `/generate` calls received
    pub fn generate_count(&self) -> u32 {
        self.state.generate_count.load(Ordering::SeqCst)
    }

    /// Number of `/generate` calls that carried an `audio_prompt` part
    pub fn prompted_count(&self) -> u32 {
        self.state.prompted_count.load(Ordering::SeqCst)
    }

    /// Number of reference clip downloads
    pub fn voice_count(&self) -> u32 {
        self.state.voice_count.load(Ordering::SeqCst)
    }
}

impl Drop for MockModel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_generate(State(state): State<Arc<MockModelState>>, body: Bytes) -> impl IntoResponse {
    state.generate_count.fetch_add(1, Ordering::SeqCst);

    let form = String::from_utf8_lossy(&body);
    if form.contains("name=\"audio_prompt\"") {
        state.prompted_count.fetch_add(1, Ordering::SeqCst);
    }

    if state.fail {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
    }

    ([(header::CONTENT_TYPE, "audio/wav")], tone(SAMPLE_RATE / 4)).into_response()
}

async fn handle_voice(State(state): State<Arc<MockModelState>>, Path(name): Path<String>) -> impl IntoResponse {
    state.voice_count.fetch_add(1, Ordering::SeqCst);

    if name == "speaker.wav" {
        ([(header::CONTENT_TYPE, "audio/wav")], tone(SAMPLE_RATE / 10)).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// 16-bit mono square wave of `samples` length
fn tone(samples: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav header");
    for i in 0..samples {
        let sample: i16 = if (i / 50) % 2 == 0 { 6_000 } else { -6_000 };
        writer.write_sample(sample).expect("wav sample");
    }
    writer.finalize().expect("wav finalize");

    cursor.into_inner()
}
