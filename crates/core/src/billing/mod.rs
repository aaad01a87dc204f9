//! Stripe webhook intake: signature verification and the event dispatch table.
//!
//! ```text
//! raw body + stripe-signature ─▶ WebhookVerifier ─▶ WebhookEvent
//!                                                     │ classify(type)
//!                                                     ▼
//!                              DispatchTable::lookup ─▶ DispatchEntry (operation + variables)
//! ```

pub mod dispatch;
pub mod signature;

pub use dispatch::{classify, DispatchEntry, DispatchKey, DispatchTable, EventClassification};
pub use signature::{
    sign_payload, SignatureError, WebhookEvent, WebhookEventData, WebhookVerifier,
    SIGNATURE_HEADER,
};
