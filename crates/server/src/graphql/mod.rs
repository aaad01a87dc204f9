//! GraphQL surface of the server.
//!
//! Browser clients reach it over `POST /graphql` with a bearer token; the
//! Stripe webhook dispatcher executes the billing mutations in-process with
//! an internal request context.

mod billing;
mod channels;
mod context;
mod http;

use async_graphql::{EmptySubscription, ErrorExtensions, MergedObject, Schema};

use billing::BillingMutations;
use channels::{ChannelMutations, QueryRoot};

pub use context::{new_request_id, AppServices, RequestContext};
pub use http::{router, GraphQlState};

#[derive(MergedObject, Default)]
pub struct MutationRoot(ChannelMutations, BillingMutations);

pub type HuddleSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(services: AppServices) -> HuddleSchema {
    Schema::build(QueryRoot, MutationRoot::default(), EmptySubscription).data(services).finish()
}

/// GraphQL error whose `extensions.code` carries a stable machine-readable code.
pub(crate) fn coded_error(message: impl Into<String>, code: &'static str) -> async_graphql::Error {
    async_graphql::Error::new(message).extend_with(|_, extensions| {
        extensions.set("code", code.to_string());
    })
}
