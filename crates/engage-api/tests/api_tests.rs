//! API integration tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use engage_api::{create_router, ApiConfig, AppState};
use engage_inference::{
    HeadTensor, InferenceError, InferenceResult, ModelGateway, ModelLoader, ModelSourceConfig, Predictor,
    RawHeadOutputs,
};
use engage_media::{Batch, ChannelOrder, FrameSource, MediaResult, Preprocessor, RawFrame, VideoOpener};
use engage_storage::{BlobFetcher, StorageResult};

const BOUNDARY: &str = "engage-test-boundary";

struct FixedPredictor;

impl Predictor for FixedPredictor {
    fn predict(&self, batch: Batch) -> InferenceResult<RawHeadOutputs> {
        assert_eq!(batch.shape(), &[1, 10, 224, 224, 3]);
        Ok(RawHeadOutputs::new(vec![
            HeadTensor::batched(vec![0.1, 0.7, 0.1, 0.1]),
            HeadTensor::batched(vec![0.05, 0.15, 0.2, 0.6]),
            HeadTensor::batched(vec![0.5, 0.3, 0.1, 0.1]),
            HeadTensor::batched(vec![0.2, 0.2, 0.5, 0.1]),
            HeadTensor::batched(vec![0.75]),
        ]))
    }
}

#[derive(Default)]
struct CountingLoader {
    calls: AtomicUsize,
    fail: bool,
}

impl ModelLoader for CountingLoader {
    fn load(&self, path: &Path) -> InferenceResult<Arc<dyn Predictor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InferenceError::model_load(path, "unsupported model format"));
        }
        Ok(Arc::new(FixedPredictor))
    }
}

#[derive(Default)]
struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl BlobFetcher for CountingFetcher {
    async fn fetch(&self, _bucket: &str, _key: &str, dest: &Path) -> StorageResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(dest, b"onnx").await?;
        Ok(4)
    }
}

struct TestApp {
    router: Router,
    loader: Arc<CountingLoader>,
    fetcher: Arc<CountingFetcher>,
    _dir: tempfile::TempDir,
}

/// Opens every upload as a 300 frame clip with one unreadable frame.
struct FakeClipOpener;

struct FakeClip;

impl FrameSource for FakeClip {
    fn total_frames(&self) -> usize {
        300
    }

    fn read_frame(&mut self, index: usize) -> MediaResult<RawFrame> {
        if index == 166 {
            return Err(engage_media::MediaError::DecodeFailure { index });
        }
        RawFrame::new(32, 24, ChannelOrder::Bgr, vec![index as u8; 32 * 24 * 3])
    }
}

impl VideoOpener for FakeClipOpener {
    fn open(&self, _path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        Ok(Box::new(FakeClip))
    }
}

fn test_app_with(loader: CountingLoader, config: ApiConfig) -> TestApp {
    test_app_from(loader, config, Preprocessor::default())
}

fn test_app_from(loader: CountingLoader, config: ApiConfig, preprocessor: Preprocessor) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let source = ModelSourceConfig::default()
        .with_local_path(dir.path().join("model.onnx"))
        .with_bucket("engage-models");

    let loader = Arc::new(loader);
    let fetcher = Arc::new(CountingFetcher::default());
    let gateway = ModelGateway::new(
        source,
        Some(fetcher.clone() as Arc<dyn BlobFetcher>),
        loader.clone() as Arc<dyn ModelLoader>,
    );

    let state = AppState::with_gateway(config, Arc::new(gateway)).with_preprocessor(preprocessor);
    TestApp {
        router: create_router(state, None),
        loader,
        fetcher,
        _dir: dir,
    }
}

fn test_app() -> TestApp {
    test_app_with(CountingLoader::default(), ApiConfig::default())
}

fn multipart_request(uri: &str, field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_fn(64, 48, |x, y| image::Rgb([x as u8 * 3, y as u8 * 5, 128]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
    buf.into_inner()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Test ping endpoint.
#[tokio::test]
async fn test_ping() {
    let app = test_app();
    let (status, body) = send(&app.router, Request::builder().uri("/ping").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Hello, I am alive".to_string()));
}

/// Test health endpoint.
#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let (status, body) = send(&app.router, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_video_with_wrong_extension_is_rejected_before_decoding() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        multipart_request("/predict", "file", "clip.mov", b"not decoded"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Invalid file type");
    assert_eq!(body["message"], "Please upload either an MP4 or AVI video file");
    assert!(body.get("traceback").is_none());
    assert_eq!(app.loader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_corrupt_image() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        multipart_request("/predict_frame", "file", "frame.jpg", b"\xff\xd8 truncated jpeg"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Invalid image");
    assert_eq!(body["message"], "Could not decode image");
    assert_eq!(app.loader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_predict_frame_success() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        multipart_request("/predict_frame", "file", "frame.png", &png_bytes()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_type"], "real-time");
    assert_eq!(body["boredom"]["level"], 1);
    assert_eq!(body["engagement"]["level"], 3);
    assert_eq!(body["confusion"]["level"], 0);
    assert_eq!(body["frustration"]["level"], 2);
    assert_eq!(body["engagement"]["probabilities"].as_array().unwrap().len(), 4);
    assert!((body["attention_score"].as_f64().unwrap() - 0.75).abs() < 1e-6);
    assert!(body.get("frames_processed").is_none());
    assert!(body.get("model_info").is_none());
}

#[tokio::test]
async fn test_model_fetched_once_across_requests() {
    let app = test_app();

    for _ in 0..2 {
        let (_, body) = send(
            &app.router,
            multipart_request("/predict_frame", "file", "frame.png", &png_bytes()),
        )
        .await;
        assert_eq!(body["model_type"], "real-time");
    }

    assert_eq!(app.fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.loader.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_model_load_failure_is_enveloped_and_retried() {
    let app = test_app_with(
        CountingLoader {
            fail: true,
            ..Default::default()
        },
        ApiConfig::default(),
    );

    for _ in 0..2 {
        let (status, body) = send(
            &app.router,
            multipart_request("/predict_frame", "file", "frame.png", &png_bytes()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Failed to process frame");
        assert!(body["error"].as_str().unwrap().contains("unsupported model format"));
        assert!(body["traceback"].is_string());
    }

    assert_eq!(app.loader.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_traceback_hidden_when_details_disabled() {
    let config = ApiConfig {
        expose_error_details: false,
        ..Default::default()
    };
    let app = test_app_with(
        CountingLoader {
            fail: true,
            ..Default::default()
        },
        config,
    );

    let (_, body) = send(
        &app.router,
        multipart_request("/predict_frame", "file", "frame.png", &png_bytes()),
    )
    .await;

    assert_eq!(body["message"], "Failed to process frame");
    assert!(body.get("traceback").is_none());
}

#[tokio::test]
async fn test_missing_file_field() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        multipart_request("/predict_frame", "image", "frame.png", &png_bytes()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Failed to process frame");
    assert!(body["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_ready_reflects_model_state() {
    let app = test_app();

    // Nothing on disk and no reachable bucket client in test state.
    let (status, body) = send(&app.router, Request::builder().uri("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["model"]["status"], "error");

    send(
        &app.router,
        multipart_request("/predict_frame", "file", "frame.png", &png_bytes()),
    )
    .await;

    let (status, body) = send(&app.router, Request::builder().uri("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["model"]["detail"], "loaded");
}

#[tokio::test]
async fn test_predict_video_success() {
    let app = test_app_from(
        CountingLoader::default(),
        ApiConfig::default(),
        Preprocessor::default().with_video_opener(Arc::new(FakeClipOpener)),
    );
    let (status, body) = send(
        &app.router,
        multipart_request("/predict", "file", "lecture.mp4", b"container bytes"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_type"], "original");
    assert_eq!(body["frames_processed"], 10);
    assert_eq!(body["engagement"]["level"], 3);
    assert!((body["attention_score"].as_f64().unwrap() - 0.75).abs() < 1e-6);
    assert_eq!(body["model_info"]["total_params"], 51_608_529);
    assert_eq!(body["model_info"]["architecture"], "CNN + LSTM + Dense layers");
    assert!(body.get("error").is_none());
    assert_eq!(app.loader.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe"]
async fn test_unreadable_video() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        multipart_request("/predict", "file", "lecture.MP4", b"definitely not a video"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Could not read video or video has no frames");
    assert_eq!(body["message"], "Failed to process video file");
}
