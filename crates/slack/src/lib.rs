//! Slack Web API access for huddle.
//!
//! Only the calls the server needs are covered:
//! - **Channel lookup** (`client`) - `conversations.info`, used to validate a
//!   channel before a team links it
//!
//! # Key Types
//!
//! - `SlackWebApi` - trait seam the channel link service depends on
//! - `HttpSlackClient` - reqwest implementation against `https://slack.com/api`
//! - `ChannelInfoResponse` - Slack's `{ok, error, channel}` envelope

pub mod client;

pub use client::{
    ChannelInfo, ChannelInfoResponse, HttpSlackClient, SlackApiError, SlackWebApi,
};
