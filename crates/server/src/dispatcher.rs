use std::sync::Arc;

use async_graphql::Variables;
use async_trait::async_trait;
use huddle_core::billing::{classify, DispatchTable, SignatureError, WebhookVerifier};
use secrecy::SecretString;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error_report::{ErrorReporter, OperationErrorReport};
use crate::graphql::{new_request_id, HuddleSchema, RequestContext};

/// A GraphQL operation selected for a verified webhook delivery.
/// `correlation_id` is the Stripe event id when the payload has one.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchedOperation {
    pub correlation_id: String,
    pub operation_name: &'static str,
    pub query: &'static str,
    pub variables: Map<String, Value>,
}

#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Runs the operation and returns the messages of any errors it reported.
    async fn execute(&self, operation: &DispatchedOperation) -> Vec<String>;
}

/// Executes operations against the schema in-process with the internal
/// server credential.
#[derive(Clone)]
pub struct SchemaExecutor {
    schema: HuddleSchema,
    server_secret: SecretString,
}

impl SchemaExecutor {
    pub fn new(schema: HuddleSchema, server_secret: SecretString) -> Self {
        Self { schema, server_secret }
    }
}

#[async_trait]
impl OperationExecutor for SchemaExecutor {
    async fn execute(&self, operation: &DispatchedOperation) -> Vec<String> {
        let request = async_graphql::Request::new(operation.query)
            .operation_name(operation.operation_name)
            .variables(Variables::from_json(Value::Object(operation.variables.clone())))
            .data(RequestContext::internal(
                self.server_secret.clone(),
                operation.correlation_id.clone(),
            ));

        let response = self.schema.execute(request).await;
        response.errors.into_iter().map(|error| error.message).collect()
    }
}

#[derive(Debug, PartialEq)]
pub enum DispatchOutcome {
    Rejected(SignatureError),
    Unhandled { event_type: String },
    Executed { operation: &'static str },
    Failed { operation: &'static str, error: String },
}

/// Verify, classify, look up and execute. Each delivery is handled on its own;
/// nothing is retried and failures go to the error reporter.
pub struct StripeWebhookDispatcher {
    verifier: WebhookVerifier,
    table: DispatchTable,
    executor: Arc<dyn OperationExecutor>,
    reporter: Arc<dyn ErrorReporter>,
}

impl StripeWebhookDispatcher {
    pub fn new(
        verifier: WebhookVerifier,
        table: DispatchTable,
        executor: Arc<dyn OperationExecutor>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self { verifier, table, executor, reporter }
    }

    /// Deliveries without a usable Stripe event id, rejected ones included,
    /// are logged under a generated request id.
    pub async fn process(&self, signature: Option<&str>, body: &[u8]) -> DispatchOutcome {
        let event = match self.verifier.verify(body, signature) {
            Ok(event) => event,
            Err(error) => {
                warn!(
                    event_name = "billing.webhook.rejected",
                    correlation_id = %new_request_id(),
                    reason = error.reason(),
                    error = %error,
                    "stripe webhook failed verification"
                );
                return DispatchOutcome::Rejected(error);
            }
        };

        let correlation_id = event
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(new_request_id);
        let classification = classify(&event.event_type);
        let Some(entry) = self.table.lookup(&classification) else {
            debug!(
                event_name = "billing.webhook.unhandled",
                correlation_id = %correlation_id,
                event_type = %event.event_type,
                "no handler registered for stripe event"
            );
            return DispatchOutcome::Unhandled { event_type: event.event_type };
        };

        let operation = DispatchedOperation {
            correlation_id,
            operation_name: entry.operation_name,
            query: entry.query,
            variables: entry.variables(&event.data.object),
        };
        let errors = self.executor.execute(&operation).await;

        match errors.into_iter().next() {
            None => {
                info!(
                    event_name = "billing.webhook.executed",
                    correlation_id = %operation.correlation_id,
                    event_type = %event.event_type,
                    operation = operation.operation_name,
                    "stripe webhook dispatched"
                );
                DispatchOutcome::Executed { operation: operation.operation_name }
            }
            Some(error) => {
                self.reporter.report(&OperationErrorReport {
                    source: "stripe-webhook",
                    correlation_id: operation.correlation_id,
                    error: error.clone(),
                    query: operation.query.to_string(),
                    variables: Value::Object(operation.variables),
                });
                DispatchOutcome::Failed { operation: operation.operation_name, error }
            }
        }
    }
}
