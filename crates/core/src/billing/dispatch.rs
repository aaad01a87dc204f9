use std::collections::HashMap;

use serde_json::{Map, Value};

/// A dotted event type split into its dispatch segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventClassification<'a> {
    pub event: &'a str,
    pub sub_event: Option<&'a str>,
    pub action: &'a str,
}

/// Splits `invoice.payment_failed` into `(invoice, -, payment_failed)` and
/// `customer.source.updated` into `(customer, source, updated)`. Everything
/// between the first and last segment is the sub event, so deeper types such as
/// `invoice.a.b.created` carry `a.b` and cannot match a registered key. A
/// single segment is both event and action.
pub fn classify(event_type: &str) -> EventClassification<'_> {
    let Some((event, rest)) = event_type.split_once('.') else {
        return EventClassification { event: event_type, sub_event: None, action: event_type };
    };

    match rest.rsplit_once('.') {
        Some((sub_event, action)) => EventClassification { event, sub_event: Some(sub_event), action },
        None => EventClassification { event, sub_event: None, action: rest },
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    pub event: String,
    pub sub_event: Option<String>,
    pub action: String,
}

impl DispatchKey {
    pub fn new(event: &str, sub_event: Option<&str>, action: &str) -> Self {
        Self {
            event: event.to_string(),
            sub_event: sub_event.map(str::to_string),
            action: action.to_string(),
        }
    }
}

impl From<&EventClassification<'_>> for DispatchKey {
    fn from(value: &EventClassification<'_>) -> Self {
        Self::new(value.event, value.sub_event, value.action)
    }
}

pub type VariableExtractor = fn(&Value) -> Map<String, Value>;

#[derive(Clone, Debug)]
pub struct DispatchEntry {
    pub operation_name: &'static str,
    pub query: &'static str,
    extract: VariableExtractor,
}

impl DispatchEntry {
    pub fn new(operation_name: &'static str, query: &'static str, extract: VariableExtractor) -> Self {
        Self { operation_name, query, extract }
    }

    pub fn variables(&self, payload: &Value) -> Map<String, Value> {
        (self.extract)(payload)
    }
}

/// Immutable mapping from classified event identity to the GraphQL operation
/// that handles it. A lookup either resolves a full key or misses.
#[derive(Clone, Debug, Default)]
pub struct DispatchTable {
    entries: HashMap<DispatchKey, DispatchEntry>,
}

impl DispatchTable {
    pub fn stripe() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            DispatchKey::new("invoice", None, "created"),
            DispatchEntry::new("StripeCreateInvoice", STRIPE_CREATE_INVOICE, invoice_vars),
        );
        entries.insert(
            DispatchKey::new("invoice", None, "payment_failed"),
            DispatchEntry::new("StripeFailPayment", STRIPE_FAIL_PAYMENT, invoice_vars),
        );
        entries.insert(
            DispatchKey::new("invoice", None, "payment_succeeded"),
            DispatchEntry::new("StripeSucceedPayment", STRIPE_SUCCEED_PAYMENT, invoice_vars),
        );
        entries.insert(
            DispatchKey::new("invoiceitem", None, "created"),
            DispatchEntry::new(
                "StripeUpdateInvoiceItem",
                STRIPE_UPDATE_INVOICE_ITEM,
                invoice_item_vars,
            ),
        );
        entries.insert(
            DispatchKey::new("customer", Some("source"), "updated"),
            DispatchEntry::new("StripeUpdateCreditCard", STRIPE_UPDATE_CREDIT_CARD, customer_vars),
        );

        Self { entries }
    }

    pub fn lookup(&self, classification: &EventClassification<'_>) -> Option<&DispatchEntry> {
        self.entries.get(&DispatchKey::from(classification))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn field(payload: &Value, source: &str) -> Value {
    payload.get(source).cloned().unwrap_or(Value::Null)
}

fn invoice_vars(payload: &Value) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("invoiceId".to_string(), field(payload, "id"));
    vars
}

fn invoice_item_vars(payload: &Value) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("invoiceItemId".to_string(), field(payload, "id"));
    vars
}

fn customer_vars(payload: &Value) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("customerId".to_string(), field(payload, "customer"));
    vars
}

const STRIPE_CREATE_INVOICE: &str = r#"
mutation StripeCreateInvoice($invoiceId: ID!) {
  stripeCreateInvoice(invoiceId: $invoiceId)
}
"#;

const STRIPE_FAIL_PAYMENT: &str = r#"
mutation StripeFailPayment($invoiceId: ID!) {
  stripeFailPayment(invoiceId: $invoiceId) {
    event {
      id
    }
  }
}
"#;

const STRIPE_SUCCEED_PAYMENT: &str = r#"
mutation StripeSucceedPayment($invoiceId: ID!) {
  stripeSucceedPayment(invoiceId: $invoiceId)
}
"#;

const STRIPE_UPDATE_INVOICE_ITEM: &str = r#"
mutation StripeUpdateInvoiceItem($invoiceItemId: ID!) {
  stripeUpdateInvoiceItem(invoiceItemId: $invoiceItemId)
}
"#;

const STRIPE_UPDATE_CREDIT_CARD: &str = r#"
mutation StripeUpdateCreditCard($customerId: ID!) {
  stripeUpdateCreditCard(customerId: $customerId)
}
"#;

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{classify, DispatchTable, EventClassification};

    #[test]
    fn classifies_two_segment_types() {
        assert_eq!(
            classify("invoice.payment_failed"),
            EventClassification { event: "invoice", sub_event: None, action: "payment_failed" }
        );
    }

    #[test]
    fn classifies_three_segment_types() {
        assert_eq!(
            classify("customer.source.updated"),
            EventClassification { event: "customer", sub_event: Some("source"), action: "updated" }
        );
    }

    #[test]
    fn deeper_types_keep_every_middle_segment() {
        assert_eq!(
            classify("invoice.unknown.nested.created"),
            EventClassification {
                event: "invoice",
                sub_event: Some("unknown.nested"),
                action: "created",
            }
        );
    }

    #[test]
    fn single_segment_type_is_its_own_action_and_misses() {
        let classification = classify("invoice");
        assert_eq!(classification.action, "invoice");
        assert_eq!(classification.sub_event, None);
        assert!(DispatchTable::stripe().lookup(&classification).is_none());

        assert!(DispatchTable::stripe().lookup(&classify("")).is_none());
    }

    #[test]
    fn unknown_types_miss_at_every_level() {
        let table = DispatchTable::stripe();
        for event_type in [
            "charge.succeeded",
            "invoice.voided",
            "customer.updated",
            "customer.source.deleted",
            "customer.card.updated",
            "customer.source",
            "invoice.created.extra.segment",
            "invoice.unknown.nested.created",
            "customer.source.extra.updated",
            "invoice.x.payment_failed",
        ] {
            assert!(table.lookup(&classify(event_type)).is_none(), "{event_type} should miss");
        }
    }

    #[test]
    fn table_resolves_every_registered_type() {
        let table = DispatchTable::stripe();
        let expectations = [
            ("invoice.created", "StripeCreateInvoice"),
            ("invoice.payment_failed", "StripeFailPayment"),
            ("invoice.payment_succeeded", "StripeSucceedPayment"),
            ("invoiceitem.created", "StripeUpdateInvoiceItem"),
            ("customer.source.updated", "StripeUpdateCreditCard"),
        ];

        assert_eq!(table.len(), expectations.len());
        for (event_type, operation) in expectations {
            let entry = table.lookup(&classify(event_type)).expect("registered entry");
            assert_eq!(entry.operation_name, operation);
            assert!(entry.query.contains(&format!("mutation {operation}")));
        }
    }

    #[test]
    fn failed_payment_extracts_invoice_id() {
        let table = DispatchTable::stripe();
        let entry = table.lookup(&classify("invoice.payment_failed")).expect("entry");

        let vars = entry.variables(&json!({ "id": "in_123", "amount_due": 4200 }));
        assert_eq!(Value::Object(vars), json!({ "invoiceId": "in_123" }));
    }

    #[test]
    fn source_update_extracts_customer_id() {
        let table = DispatchTable::stripe();
        let entry = table.lookup(&classify("customer.source.updated")).expect("entry");

        let vars = entry.variables(&json!({ "id": "card_1", "customer": "cus_456" }));
        assert_eq!(Value::Object(vars), json!({ "customerId": "cus_456" }));
    }

    #[test]
    fn missing_payload_field_becomes_null() {
        let table = DispatchTable::stripe();
        let entry = table.lookup(&classify("invoiceitem.created")).expect("entry");

        let vars = entry.variables(&json!({}));
        assert_eq!(Value::Object(vars), json!({ "invoiceItemId": null }));
    }
}
