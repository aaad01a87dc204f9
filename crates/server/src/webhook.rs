use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use huddle_core::billing::SIGNATURE_HEADER;

use crate::dispatcher::StripeWebhookDispatcher;

pub const STRIPE_WEBHOOK_PATH: &str = "/webhooks/stripe";

#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<StripeWebhookDispatcher>,
}

pub fn router(dispatcher: Arc<StripeWebhookDispatcher>) -> Router {
    Router::new()
        .route(STRIPE_WEBHOOK_PATH, post(stripe_webhook))
        .with_state(WebhookState { dispatcher })
}

/// Acknowledges every delivery immediately. Verification and dispatch run
/// after the response on a detached task.
pub async fn stripe_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature =
        headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok()).map(str::to_string);

    tokio::spawn(async move {
        state.dispatcher.process(signature.as_deref(), &body).await;
    });

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use huddle_core::billing::{sign_payload, DispatchTable, WebhookVerifier};
    use huddle_core::domain::billing::BillingEventKind;
    use huddle_db::BillingEventRepository;
    use secrecy::SecretString;
    use serde_json::json;
    use tower::ServiceExt;

    use super::router;
    use crate::dispatcher::{SchemaExecutor, StripeWebhookDispatcher};
    use crate::error_report::TracingErrorReporter;
    use crate::test_support::{TestHarness, SERVER_SECRET, WEBHOOK_SECRET};

    fn app(harness: &TestHarness) -> axum::Router {
        let dispatcher = StripeWebhookDispatcher::new(
            WebhookVerifier::new(SecretString::from(WEBHOOK_SECRET.to_string()), 300),
            DispatchTable::stripe(),
            Arc::new(SchemaExecutor::new(
                harness.schema.clone(),
                SecretString::from(SERVER_SECRET.to_string()),
            )),
            Arc::new(TracingErrorReporter),
        );
        router(Arc::new(dispatcher))
    }

    #[tokio::test]
    async fn bad_signature_is_still_acknowledged() {
        let harness = TestHarness::new();
        let request = Request::post("/webhooks/stripe")
            .header("stripe-signature", "t=1,v1=deadbeef")
            .body(Body::from(r#"{"type":"invoice.created","data":{"object":{"id":"in_1"}}}"#))
            .expect("request");

        let response = app(&harness).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let stored = harness
            .billing_events
            .find(BillingEventKind::InvoiceCreated, "in_1")
            .await
            .expect("lookup");
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn signed_delivery_is_acknowledged_then_processed() {
        let harness = TestHarness::new();
        let body = json!({
            "id": "evt_1",
            "type": "invoice.payment_succeeded",
            "data": { "object": { "id": "in_42" } }
        })
        .to_string();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign_payload(WEBHOOK_SECRET, timestamp, body.as_bytes()).expect("sign");
        let request = Request::post("/webhooks/stripe")
            .header("stripe-signature", format!("t={timestamp},v1={signature}"))
            .body(Body::from(body))
            .expect("request");

        let response = app(&harness).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let mut stored = None;
        for _ in 0..50 {
            stored = harness
                .billing_events
                .find(BillingEventKind::PaymentSucceeded, "in_42")
                .await
                .expect("lookup");
            if stored.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(stored.is_some(), "billing event should be recorded after acknowledgement");
    }
}
