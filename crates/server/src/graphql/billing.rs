use async_graphql::{Context, Object, Result, SimpleObject, ID};
use huddle_core::domain::billing::{BillingEvent, BillingEventKind};
use huddle_core::errors::ApplicationError;
use tracing::info;

use super::{coded_error, AppServices, RequestContext};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "BillingEvent")]
pub struct BillingEventNode {
    pub id: ID,
    pub kind: String,
    pub object_id: ID,
    pub received_at: String,
}

impl From<BillingEvent> for BillingEventNode {
    fn from(event: BillingEvent) -> Self {
        Self {
            id: ID(event.id),
            kind: event.kind.as_str().to_string(),
            object_id: ID(event.object_id),
            received_at: event.received_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, SimpleObject)]
pub struct StripeFailPaymentPayload {
    pub event: BillingEventNode,
}

/// Mutations driven by Stripe notifications. Callable only with the internal
/// server secret; each records at most one billing event per object.
#[derive(Default)]
pub struct BillingMutations;

#[Object]
impl BillingMutations {
    async fn stripe_create_invoice(&self, ctx: &Context<'_>, invoice_id: ID) -> Result<bool> {
        record(ctx, BillingEventKind::InvoiceCreated, invoice_id).await.map(|_| true)
    }

    async fn stripe_fail_payment(
        &self,
        ctx: &Context<'_>,
        invoice_id: ID,
    ) -> Result<StripeFailPaymentPayload> {
        let event = record(ctx, BillingEventKind::PaymentFailed, invoice_id).await?;
        Ok(StripeFailPaymentPayload { event: event.into() })
    }

    async fn stripe_succeed_payment(&self, ctx: &Context<'_>, invoice_id: ID) -> Result<bool> {
        record(ctx, BillingEventKind::PaymentSucceeded, invoice_id).await.map(|_| true)
    }

    async fn stripe_update_invoice_item(
        &self,
        ctx: &Context<'_>,
        invoice_item_id: ID,
    ) -> Result<bool> {
        record(ctx, BillingEventKind::InvoiceItemUpdated, invoice_item_id).await.map(|_| true)
    }

    async fn stripe_update_credit_card(&self, ctx: &Context<'_>, customer_id: ID) -> Result<bool> {
        record(ctx, BillingEventKind::CreditCardUpdated, customer_id).await.map(|_| true)
    }
}

async fn record(ctx: &Context<'_>, kind: BillingEventKind, object_id: ID) -> Result<BillingEvent> {
    let services = ctx.data::<AppServices>()?;
    let request = ctx.data::<RequestContext>()?;

    if !request.carries_server_secret(&services.server_secret) {
        let error = ApplicationError::Unauthorized(format!(
            "{kind} requires the internal server credential"
        ));
        return Err(coded_error(error.to_string(), error.code()));
    }

    let event = services
        .billing_events
        .record(BillingEvent::new(kind, object_id.0))
        .await
        .map_err(|error| {
            let error = ApplicationError::Persistence(error.to_string());
            coded_error(error.to_string(), error.code())
        })?;

    info!(
        event_name = "billing.event.recorded",
        correlation_id = %request.correlation_id,
        billing_event_id = %event.id,
        kind = %event.kind,
        object_id = %event.object_id,
        "billing event recorded"
    );
    Ok(event)
}
