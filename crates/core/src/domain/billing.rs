use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingEventKind {
    InvoiceCreated,
    PaymentFailed,
    PaymentSucceeded,
    InvoiceItemUpdated,
    CreditCardUpdated,
}

impl BillingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvoiceCreated => "invoice_created",
            Self::PaymentFailed => "payment_failed",
            Self::PaymentSucceeded => "payment_succeeded",
            Self::InvoiceItemUpdated => "invoice_item_updated",
            Self::CreditCardUpdated => "credit_card_updated",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "invoice_created" => Some(Self::InvoiceCreated),
            "payment_failed" => Some(Self::PaymentFailed),
            "payment_succeeded" => Some(Self::PaymentSucceeded),
            "invoice_item_updated" => Some(Self::InvoiceItemUpdated),
            "credit_card_updated" => Some(Self::CreditCardUpdated),
            _ => None,
        }
    }
}

impl fmt::Display for BillingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A billing side effect recorded on behalf of a Stripe notification.
/// `(kind, object_id)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingEvent {
    pub id: String,
    pub kind: BillingEventKind,
    pub object_id: String,
    pub received_at: DateTime<Utc>,
}

impl BillingEvent {
    pub fn new(kind: BillingEventKind, object_id: impl Into<String>) -> Self {
        Self {
            id: format!("BILLEV-{}", uuid::Uuid::new_v4().simple()),
            kind,
            object_id: object_id.into(),
            received_at: Utc::now(),
        }
    }
}
