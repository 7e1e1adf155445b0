//! Integration tests for the delivery chain.
//!
//! These tests verify that the InjectionOrchestrator correctly:
//! - Walks the strategy chain in order and stops at the first success
//! - Halts on authentication failures instead of retrying them elsewhere
//! - Skips network strategies when no target is detectable
//! - Serializes concurrent deliveries of the same artifact
//! - Emits exactly one user notice per terminal failure

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowcourier_auth::CredentialManager;
use flowcourier_core::config::{DeliveryConfig, TargetConfig};
use flowcourier_core::model::{Artifact, Node};
use flowcourier_core::notice::{Notice, NoticeSink};
use flowcourier_core::store::{DualStore, MemoryStore};
use flowcourier_inject::{
    DeliveryError, DeliveryReport, HandoffSlots, InjectionOrchestrator, Navigator, PageSurface,
    ClipboardAccess, Strategy, TargetDetector, WorkflowApiClient,
};

const TEST_CREDENTIAL: &str = "sk-live-0123456789abcdef";

#[derive(Default)]
struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

struct MockPage {
    import_available: AtomicBool,
    paste_available: AtomicBool,
    activations: AtomicUsize,
    filled: Mutex<Vec<String>>,
}

impl MockPage {
    fn new() -> Self {
        Self {
            import_available: AtomicBool::new(true),
            paste_available: AtomicBool::new(true),
            activations: AtomicUsize::new(0),
            filled: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageSurface for MockPage {
    async fn activate_import_control(&self) -> bool {
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.import_available.load(Ordering::SeqCst)
    }

    async fn fill_paste_surface(&self, serialized: &str) -> bool {
        if !self.paste_available.load(Ordering::SeqCst) {
            return false;
        }
        self.filled.lock().push(serialized.to_string());
        true
    }
}

struct MockNavigator {
    url: Mutex<String>,
    on_app: AtomicBool,
    navigations: Mutex<Vec<String>>,
}

impl MockNavigator {
    fn new(url: &str, on_app: bool) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            on_app: AtomicBool::new(on_app),
            navigations: Mutex::new(Vec::new()),
        }
    }
}

impl Navigator for MockNavigator {
    fn current_url(&self) -> String {
        self.url.lock().clone()
    }

    fn on_target_application(&self) -> bool {
        self.on_app.load(Ordering::SeqCst)
    }

    fn navigate(&self, url: &str) {
        self.navigations.lock().push(url.to_string());
    }
}

struct MockClipboard {
    available: AtomicBool,
    copied: Mutex<Vec<String>>,
}

impl MockClipboard {
    fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            copied: Mutex::new(Vec::new()),
        }
    }
}

impl ClipboardAccess for MockClipboard {
    fn copy(&self, text: &str) -> bool {
        if !self.available.load(Ordering::SeqCst) {
            return false;
        }
        self.copied.lock().push(text.to_string());
        true
    }
}

struct Fixture {
    orchestrator: Arc<InjectionOrchestrator>,
    credentials: Arc<CredentialManager>,
    handoff: HandoffSlots,
    page: Arc<MockPage>,
    navigator: Arc<MockNavigator>,
    clipboard: Arc<MockClipboard>,
    sink: Arc<RecordingSink>,
}

fn fixture(current_url: &str, on_target: bool) -> Fixture {
    let target = TargetConfig::default();
    let delivery = DeliveryConfig {
        api_timeout_ms: 5_000,
        connectivity_timeout_ms: 1_000,
        settle_delay_ms: 10,
    };

    let store = Arc::new(DualStore::new(
        Box::new(MemoryStore::new()),
        Box::new(MemoryStore::new()),
    ));
    let sink = Arc::new(RecordingSink::default());
    let credentials = Arc::new(
        CredentialManager::new(store.clone(), sink.clone(), &target, &delivery).unwrap(),
    );
    let handoff = HandoffSlots::new(store);
    let page = Arc::new(MockPage::new());
    let navigator = Arc::new(MockNavigator::new(current_url, on_target));
    let clipboard = Arc::new(MockClipboard::new());

    let orchestrator = Arc::new(InjectionOrchestrator::new(
        handoff.clone(),
        credentials.clone(),
        TargetDetector::from_config(&target),
        WorkflowApiClient::new(&target, &delivery).unwrap(),
        page.clone(),
        navigator.clone(),
        clipboard.clone(),
        sink.clone(),
        &target,
        &delivery,
    ));

    Fixture {
        orchestrator,
        credentials,
        handoff,
        page,
        navigator,
        clipboard,
        sink,
    }
}

fn sample_artifact() -> Artifact {
    Artifact::new("Lead intake")
        .with_node(Node::new("Form trigger", "trigger.form"))
        .with_node(Node::new("Notify", "action.email"))
}

fn page_url(server: &MockServer) -> String {
    format!("{}/workflow/7", server.uri())
}

#[tokio::test]
async fn test_api_success_is_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "wf-99" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    let report = f.orchestrator.deliver(&sample_artifact()).await;

    assert!(matches!(
        report,
        DeliveryReport::Delivered {
            strategy: Strategy::Api
        }
    ));
    // New workflow id came back, so the panel is told to reopen
    assert!(f.handoff.take_reopen_flag().await);
    assert!(f.navigator.navigations.lock().is_empty());
    assert!(f.clipboard.copied.lock().is_empty());
    assert!(f.sink.notices.lock().is_empty());
}

#[tokio::test]
async fn test_api_success_without_id_sets_no_resume_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    let report = f.orchestrator.deliver(&sample_artifact()).await;

    assert!(matches!(
        report,
        DeliveryReport::Delivered {
            strategy: Strategy::Api
        }
    ));
    assert!(!f.handoff.take_reopen_flag().await);
}

#[tokio::test]
async fn test_api_sends_saved_credential_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .and(header("X-FLOWDESK-API-KEY", TEST_CREDENTIAL))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    f.credentials.save(TEST_CREDENTIAL).await.unwrap();

    let report = f.orchestrator.deliver(&sample_artifact()).await;
    assert!(matches!(report, DeliveryReport::Delivered { .. }));
}

#[tokio::test]
async fn test_server_error_falls_through_to_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    let report = f.orchestrator.deliver(&sample_artifact()).await;

    // Redirect is next in line, never a jump straight to the clipboard
    assert!(matches!(
        report,
        DeliveryReport::Delivered {
            strategy: Strategy::Redirect
        }
    ));

    let navigations = f.navigator.navigations.lock().clone();
    assert_eq!(navigations, vec![format!("{}/workflow/new", server.uri())]);

    // The artifact was stashed for the post-navigation bootstrap
    let stashed = f.handoff.take_pending_artifact().await.unwrap().unwrap();
    assert_eq!(stashed, sample_artifact());
    assert!(f.handoff.take_reopen_flag().await);

    assert!(f.clipboard.copied.lock().is_empty());
    assert_eq!(f.page.activations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_redirect_skipped_off_target_falls_to_dom() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Base address resolves, but the page is not the target application
    let f = fixture(&page_url(&server), false);
    let report = f.orchestrator.deliver(&sample_artifact()).await;

    assert!(matches!(
        report,
        DeliveryReport::Delivered {
            strategy: Strategy::Dom
        }
    ));
    assert!(f.navigator.navigations.lock().is_empty());
    assert_eq!(f.page.filled.lock().len(), 1);
}

#[tokio::test]
async fn test_unauthorized_without_credential_halts_and_prompts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    let report = f.orchestrator.deliver(&sample_artifact()).await;

    match report {
        DeliveryReport::Failed { error, serialized } => {
            assert!(matches!(error, DeliveryError::CredentialMissing));
            assert!(serialized.is_none());
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    // Acquisition is prompted; no later strategy runs automatically
    assert_eq!(
        f.sink.notices.lock().as_slice(),
        &[Notice::CredentialRequired]
    );
    assert!(f.navigator.navigations.lock().is_empty());
    assert_eq!(f.page.activations.load(Ordering::SeqCst), 0);
    assert!(f.clipboard.copied.lock().is_empty());
}

#[tokio::test]
async fn test_unauthorized_with_credential_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    f.credentials.save(TEST_CREDENTIAL).await.unwrap();

    let report = f.orchestrator.deliver(&sample_artifact()).await;

    assert!(matches!(
        report,
        DeliveryReport::Failed {
            error: DeliveryError::CredentialRejected,
            ..
        }
    ));
    assert_eq!(
        f.sink.notices.lock().as_slice(),
        &[Notice::CredentialRejected]
    );
}

#[tokio::test]
async fn test_forbidden_halts_with_access_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    f.credentials.save(TEST_CREDENTIAL).await.unwrap();

    let report = f.orchestrator.deliver(&sample_artifact()).await;

    assert!(matches!(
        report,
        DeliveryReport::Failed {
            error: DeliveryError::RemoteForbidden,
            ..
        }
    ));
    assert_eq!(f.sink.notices.lock().as_slice(), &[Notice::AccessDenied]);
}

#[tokio::test]
async fn test_unknown_host_goes_straight_to_dom() {
    let f = fixture("https://blog.example.com/article", false);
    let report = f.orchestrator.deliver(&sample_artifact()).await;

    assert!(matches!(
        report,
        DeliveryReport::Delivered {
            strategy: Strategy::Dom
        }
    ));

    let filled = f.page.filled.lock().clone();
    assert_eq!(filled.len(), 1);
    assert!(filled[0].contains("Lead intake"));
    assert!(f.navigator.navigations.lock().is_empty());
}

#[tokio::test]
async fn test_dom_failure_falls_back_to_clipboard() {
    let f = fixture("https://blog.example.com/article", false);
    f.page.import_available.store(false, Ordering::SeqCst);

    let report = f.orchestrator.deliver(&sample_artifact()).await;

    assert!(matches!(
        report,
        DeliveryReport::Delivered {
            strategy: Strategy::Clipboard
        }
    ));

    let copied = f.clipboard.copied.lock().clone();
    assert_eq!(copied.len(), 1);
    assert!(copied[0].contains("Lead intake"));
    assert!(f.sink.notices.lock().is_empty());
}

#[tokio::test]
async fn test_total_failure_surfaces_raw_text_and_one_notice() {
    let f = fixture("https://blog.example.com/article", false);
    f.page.import_available.store(false, Ordering::SeqCst);
    f.clipboard.available.store(false, Ordering::SeqCst);

    let report = f.orchestrator.deliver(&sample_artifact()).await;

    match report {
        DeliveryReport::Failed { error, serialized } => {
            assert!(matches!(error, DeliveryError::ClipboardUnavailable));
            let raw = serialized.expect("raw text for manual copy");
            assert!(raw.contains("Lead intake"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    let notices = f.sink.notices.lock().clone();
    assert_eq!(notices.len(), 1);
    assert!(matches!(notices[0], Notice::DeliveryFailed { .. }));
}

#[tokio::test]
async fn test_second_delivery_of_same_artifact_is_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);
    let artifact = sample_artifact();

    let orchestrator = f.orchestrator.clone();
    let first_artifact = artifact.clone();
    let first = tokio::spawn(async move { orchestrator.deliver(&first_artifact).await });

    // Give the first call time to reach the network
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = f.orchestrator.deliver(&artifact).await;
    assert!(matches!(second, DeliveryReport::Busy));

    let first = first.await.unwrap();
    assert!(matches!(
        first,
        DeliveryReport::Delivered {
            strategy: Strategy::Api
        }
    ));
    // expect(1) on the mock proves exactly one network call was issued
}

#[tokio::test]
async fn test_distinct_artifacts_deliver_independently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let f = fixture(&page_url(&server), true);

    let first = f.orchestrator.deliver(&sample_artifact()).await;
    let second = f
        .orchestrator
        .deliver(&Artifact::new("Different workflow"))
        .await;

    assert!(matches!(first, DeliveryReport::Delivered { .. }));
    assert!(matches!(second, DeliveryReport::Delivered { .. }));
}
