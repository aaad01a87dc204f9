use async_graphql::Variables;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{new_request_id, HuddleSchema, RequestContext};
use crate::auth::TokenDecoder;

pub const SOCKET_ID_HEADER: &str = "x-socket-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct GraphQlState {
    pub schema: HuddleSchema,
    pub tokens: TokenDecoder,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlBody {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Option<Value>,
}

pub fn router(state: GraphQlState) -> Router {
    Router::new().route("/graphql", post(graphql)).with_state(state)
}

/// A missing or invalid bearer token runs the request as anonymous; resolvers
/// that need a viewer reject it. An `x-request-id` header becomes the
/// correlation id, otherwise one is generated.
pub async fn graphql(
    State(state): State<GraphQlState>,
    headers: HeaderMap,
    Json(body): Json<GraphQlBody>,
) -> Json<async_graphql::Response> {
    let correlation_id = correlation_id(&headers);
    let viewer = state.tokens.from_headers(&headers).unwrap_or_else(|error| {
        warn!(
            event_name = "auth.bearer.rejected",
            correlation_id = %correlation_id,
            error = %error,
            "treating graphql request with invalid credentials as anonymous"
        );
        None
    });
    let socket_id = header_value(&headers, SOCKET_ID_HEADER);

    let mut request = async_graphql::Request::new(body.query);
    if let Some(operation_name) = body.operation_name {
        request = request.operation_name(operation_name);
    }
    if let Some(variables) = body.variables {
        request = request.variables(Variables::from_json(variables));
    }
    let context = RequestContext::for_user(viewer, socket_id).with_correlation_id(correlation_id);

    Json(state.schema.execute(request.data(context)).await)
}

fn correlation_id(headers: &HeaderMap) -> String {
    header_value(headers, REQUEST_ID_HEADER)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(new_request_id)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderMap, HeaderValue, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{correlation_id, router, GraphQlState, REQUEST_ID_HEADER};
    use crate::auth::{issue_token, TokenDecoder};
    use crate::test_support::{member_token, TestHarness};

    fn app(harness: &TestHarness) -> axum::Router {
        router(GraphQlState {
            schema: harness.schema.clone(),
            tokens: TokenDecoder::new(&secrecy::SecretString::from("jwt-secret".to_string())),
        })
    }

    fn graphql_request(authorization: Option<String>, body: Value) -> Request<Body> {
        let mut builder = Request::post("/graphql")
            .header("content-type", "application/json")
            .header("x-socket-id", "socket-42");
        if let Some(authorization) = authorization {
            builder = builder.header("authorization", authorization);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    #[tokio::test]
    async fn bearer_user_can_link_a_channel_over_http() {
        let harness = TestHarness::new();
        let mut notifications = harness.pubsub.subscribe();
        let token = issue_token("jwt-secret", &member_token("user-1", &["team-1"]));

        let response = app(&harness)
            .oneshot(graphql_request(
                Some(format!("Bearer {token}")),
                json!({
                    "query": "mutation($input: AddSlackChannelInput!) { addSlackChannel(input: $input) { channel { name } } }",
                    "variables": { "input": { "teamMemberId": "user-1::team-1", "slackChannelId": "C123" } }
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(body["data"]["addSlackChannel"]["channel"]["name"], "general");

        let notification = notifications.try_recv().expect("notification");
        assert_eq!(notification.mutator_id.as_deref(), Some("socket-42"));
    }

    #[tokio::test]
    async fn invalid_bearer_token_runs_as_anonymous() {
        let harness = TestHarness::new();

        let response = app(&harness)
            .oneshot(graphql_request(
                Some("Bearer not-a-jwt".to_string()),
                json!({ "query": "{ slackChannels(teamId: \"team-1\") { name } }" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(body["errors"][0]["extensions"]["code"], "TEAM_ACCESS");
    }

    #[test]
    fn request_id_header_becomes_the_correlation_id() {
        let mut headers = HeaderMap::new();
        assert!(correlation_id(&headers).starts_with("req_"));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("  "));
        assert!(correlation_id(&headers).starts_with("req_"));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("edge-abc123"));
        assert_eq!(correlation_id(&headers), "edge-abc123");
    }
}
