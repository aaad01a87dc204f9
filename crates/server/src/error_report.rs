use serde_json::Value;
use tracing::error;

/// A GraphQL operation that reported errors while running outside of any
/// caller's request.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationErrorReport {
    pub source: &'static str,
    pub correlation_id: String,
    pub error: String,
    pub query: String,
    pub variables: Value,
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: &OperationErrorReport);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, report: &OperationErrorReport) {
        error!(
            event_name = "billing.webhook.operation_failed",
            correlation_id = %report.correlation_id,
            source = report.source,
            error = %report.error,
            query = %report.query.trim(),
            variables = %report.variables,
            "operation triggered by webhook reported errors"
        );
    }
}
