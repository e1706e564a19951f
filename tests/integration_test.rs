//! Integration tests for Ruster Sniper
//!
//! The pipeline and HTTP router run end-to-end against in-memory
//! collaborators; nothing touches the network.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use eyre::Result;
use ruster_sniper::api::{create_router, AppState, WebhookVerifier};
use ruster_sniper::core::{BlockList, MetadataSource, SniperPipeline, TextExtractor, TradeDispatcher};
use ruster_sniper::utils::constants::WSOL_MINT;
use ruster_sniper::{
    NotificationPayload, PipelineOutcome, SourceKind, TelemetryCollector, TokenMetadata,
    TradePolicy, TradePolicyTable, TradeReceipt, WebhookResponse,
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ============================================
// In-memory collaborators
// ============================================

/// Resolves exactly the listed mints
struct KnownMints(Vec<String>);

#[async_trait]
impl MetadataSource for KnownMints {
    async fn lookup(&self, address: &str) -> Result<Option<TokenMetadata>> {
        if !self.0.iter().any(|m| m == address) {
            return Ok(None);
        }
        Ok(Some(TokenMetadata {
            decimals: 9,
            supply: 1_000_000_000_000_000,
            is_initialized: true,
            token_program: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".to_string(),
            mint_authority: None,
            freeze_authority: None,
        }))
    }
}

/// Returns canned OCR text
struct CannedOcr(String);

#[async_trait]
impl TextExtractor for CannedOcr {
    async fn extract_text(&self, _image_url: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct PaperTrader {
    buys: Mutex<Vec<String>>,
}

#[async_trait]
impl TradeDispatcher for PaperTrader {
    async fn buy(&self, mint: &str, policy: &TradePolicy) -> Result<TradeReceipt> {
        self.buys.lock().unwrap().push(mint.to_string());
        Ok(TradeReceipt {
            signature: format!("sig-{}", &mint[..8]),
            in_amount_lamports: policy.amount_lamports,
            quoted_out_amount: 1,
        })
    }
}

fn mint() -> String {
    // "2RJD1KnDRGEkvuFfAGrJ7PD28LRE9LRDjZznDywagzmr"
    bs58::encode([21u8; 32]).into_string()
}

/// Swap Latin letters for Cyrillic look-alikes
fn disguise(address: &str) -> String {
    address
        .chars()
        .map(|c| match c {
            'K' => 'К',
            'E' => 'Е',
            'A' => 'А',
            'P' => 'Р',
            'a' => 'а',
            'y' => 'у',
            other => other,
        })
        .collect()
}

fn pipeline(trader: Arc<PaperTrader>, ocr_text: Option<&str>) -> SniperPipeline {
    let pipeline = SniperPipeline::new(
        BlockList::with_defaults(Vec::<String>::new()),
        TradePolicyTable::builtin(),
        Arc::new(KnownMints(vec![mint()])),
        trader,
        Arc::new(TelemetryCollector::new()),
    );
    match ocr_text {
        Some(text) => pipeline.with_ocr(Arc::new(CannedOcr(text.to_string()))),
        None => pipeline,
    }
}

// ============================================
// Pipeline end-to-end
// ============================================

#[tokio::test]
async fn test_text_only_notification_buys_hidden_mint() {
    let trader = Arc::new(PaperTrader::default());
    let hidden = disguise(&mint());
    assert_ne!(hidden, mint());

    let payload = NotificationPayload {
        text: Some(format!("🚀 stealth launch, CA: {} LFG", hidden)),
        ..Default::default()
    };

    let outcome = pipeline(trader.clone(), None).process(&payload).await.unwrap();
    let response = WebhookResponse::from(outcome);

    assert_eq!(response.status, "success");
    assert_eq!(response.source, Some(SourceKind::TextOnly));
    assert_eq!(response.mint.as_deref(), Some(mint().as_str()));
    assert!(response.message.starts_with("Successfully processed notification: bought"));
    assert_eq!(*trader.buys.lock().unwrap(), vec![mint()]);
}

#[tokio::test]
async fn test_blocked_address_in_image_is_not_bought() {
    let trader = Arc::new(PaperTrader::default());
    let payload = NotificationPayload {
        text: Some("chart looks good".to_string()),
        image: Some("https://img.example/chart.png".to_string()),
        ..Default::default()
    };
    let ocr_text = format!("pair: {}", WSOL_MINT);

    let outcome = pipeline(trader.clone(), Some(&ocr_text))
        .process(&payload)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        PipelineOutcome::NoValidToken {
            source: SourceKind::TextAndImage
        }
    );

    let response = WebhookResponse::from(outcome);
    assert_eq!(response.status, "success");
    assert_eq!(response.message, "No valid token addresses found");
    assert!(trader.buys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_without_addresses() {
    let trader = Arc::new(PaperTrader::default());
    let payload = NotificationPayload {
        text: Some("gm, nothing to see here".to_string()),
        full_text: Some("gm, nothing to see here at all".to_string()),
        ..Default::default()
    };

    let outcome = pipeline(trader, None).process(&payload).await.unwrap();
    let response = WebhookResponse::from(outcome);
    assert_eq!(response.status, "success");
    assert!(response.message.starts_with("Successfully processed"));
    assert!(response.mint.is_none());
}

#[tokio::test]
async fn test_mint_found_in_image_text() {
    let trader = Arc::new(PaperTrader::default());
    let payload = NotificationPayload {
        image: Some("https://img.example/ca.png".to_string()),
        ..Default::default()
    };
    let ocr_text = format!("Contract\n{}\n", mint());

    let outcome = pipeline(trader.clone(), Some(&ocr_text))
        .process(&payload)
        .await
        .unwrap();
    let PipelineOutcome::Bought { source, token, .. } = outcome else {
        panic!("expected the OCR mint to be bought");
    };
    assert_eq!(source, SourceKind::TextAndImage);
    assert_eq!(token.mint, mint());
}

// ============================================
// HTTP router
// ============================================

const SECRET_KEY: &[u8] = b"integration-test-webhook-secret";

fn router(verifier: Option<WebhookVerifier>) -> (Router, Arc<PaperTrader>) {
    let trader = Arc::new(PaperTrader::default());
    let state = Arc::new(AppState::new(pipeline(trader.clone(), None), verifier, false));
    (create_router(state), trader)
}

fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(&format!("whsec_{}", BASE64.encode(SECRET_KEY))).unwrap()
}

fn now() -> String {
    chrono::Utc::now().timestamp().to_string()
}

fn webhook_request(body: &str, timestamp: &str, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("webhook-id", "msg_integration")
        .header("webhook-timestamp", timestamp);
    if let Some(sig) = signature {
        builder = builder.header("webhook-signature", sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let (app, trader) = router(Some(verifier()));
    let body = format!(r#"{{"text": "{}"}}"#, mint());

    let response = app
        .oneshot(webhook_request(&body, &now(), Some("v1,bm90IGEgc2lnbmF0dXJl".to_string())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json: WebhookResponse = read_json(response).await;
    assert_eq!(json.status, "error");
    assert_eq!(json.message, "Invalid webhook signature");
    assert!(trader.buys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_signed_webhook_runs_pipeline() {
    let verifier = verifier();
    let (app, trader) = router(Some(verifier.clone()));
    let body = format!(r#"{{"text": "CA {}", "user": "cautious"}}"#, mint());

    let ts = now();
    let signature = verifier
        .signature_header("msg_integration", &ts, body.as_bytes())
        .unwrap();
    let request = webhook_request(&body, &ts, Some(signature));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json: WebhookResponse = read_json(response).await;
    assert_eq!(json.status, "success");
    assert_eq!(json.mint.as_deref(), Some(mint().as_str()));
    assert_eq!(trader.buys.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unsigned_webhook_accepted_without_secret() {
    let (app, _) = router(None);
    let response = app
        .oneshot(webhook_request(r#"{"text": "no addresses"}"#, &now(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: WebhookResponse = read_json(response).await;
    assert!(json.message.starts_with("Successfully processed"));
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let (app, _) = router(None);
    let response = app
        .oneshot(webhook_request("not json", &now(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: WebhookResponse = read_json(response).await;
    assert_eq!(json.status, "error");
}

#[tokio::test]
async fn test_health_and_stats() {
    let (app, _) = router(None);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = read_json(response).await;
    assert_eq!(json["data"]["status"], "healthy");

    let response = app
        .oneshot(Request::builder().uri("/v1/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = read_json(response).await;
    assert_eq!(json["data"]["signature_check"], false);
    assert_eq!(json["data"]["pipeline"]["notifications_received"], 0);
}
