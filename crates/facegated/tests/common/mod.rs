#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use facegate_core::{AnalyzerError, Embedding, FaceAnalyzer, RgbFrame, Strategy};
use facegated::{init, server, AppState, Config};
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "facegate-test-boundary";

/// Treats the centre pixel as "the face": black means no face, any other
/// colour encodes to that colour. Same colour means same person.
pub struct ColourAnalyzer {
    pub calls: Arc<AtomicUsize>,
}

impl FaceAnalyzer for ColourAnalyzer {
    fn detect_and_encode(&mut self, frame: &RgbFrame) -> Result<Vec<Embedding>, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let px = frame.pixel(frame.width / 2, frame.height / 2);
        if px == [0, 0, 0] {
            return Ok(vec![]);
        }
        Ok(vec![Embedding::new(px.iter().map(|&c| c as f32).collect())])
    }

    fn same_identity(&self, probe: &Embedding, reference: &Embedding) -> bool {
        probe.similarity(reference) > 0.99
    }
}

pub const GOLDEN: [u8; 3] = [200, 120, 80];
pub const STRANGER: [u8; 3] = [20, 40, 220];
pub const NO_FACE: [u8; 3] = [0, 0, 0];

pub fn png(colour: [u8; 3]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_pixel(8, 8, Rgb(colour))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub struct TestApp {
    pub router: Router,
    pub calls: Arc<AtomicUsize>,
    _dir: TempDir,
}

impl TestApp {
    /// Temp directory holding face_data/ and templates/.
    pub fn root(&self) -> &Path {
        self._dir.path()
    }

    pub fn analyzer_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }
}

/// Lay out face_data/ and templates/ in a temp dir and start the app.
/// `golden` of `None` leaves the golden image out.
pub async fn spawn_app(strategy: Strategy, golden: Option<[u8; 3]>) -> TestApp {
    let calls = Arc::new(AtomicUsize::new(0));
    let analyzer = ColourAnalyzer {
        calls: Arc::clone(&calls),
    };
    spawn_app_with(strategy, golden, Box::new(analyzer), calls).await
}

pub async fn spawn_app_with(
    strategy: Strategy,
    golden: Option<[u8; 3]>,
    analyzer: Box<dyn FaceAnalyzer>,
    calls: Arc<AtomicUsize>,
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_layout(root, golden);

    let config = Config {
        face_data_dir: root.join("face_data"),
        golden_image: Some(root.join("face_data/golden.png")),
        templates_dir: root.join("templates"),
        model_dir: root.join("models"),
        strategy,
        ..Config::default()
    };

    let engine = init::start_engine(&config, analyzer).unwrap();
    let state = Arc::new(AppState::new(engine, config.templates_dir.clone()));

    TestApp {
        router: server::build_router(state, config.max_upload_bytes()),
        calls,
        _dir: dir,
    }
}

fn write_layout(root: &Path, golden: Option<[u8; 3]>) {
    std::fs::create_dir_all(root.join("face_data")).unwrap();
    std::fs::create_dir_all(root.join("templates")).unwrap();
    std::fs::write(root.join("templates/index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(root.join("templates/taunting.html"), "<h1>nope</h1>").unwrap();
    if let Some(colour) = golden {
        std::fs::write(root.join("face_data/golden.png"), png(colour)).unwrap();
    }
}

/// POST /verify with a single multipart file part.
pub fn verify_request(field: &str, filename: Option<&str>, bytes: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/verify")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn verify_image(bytes: &[u8]) -> Request<Body> {
    verify_request("image", Some("probe.png"), bytes)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}
