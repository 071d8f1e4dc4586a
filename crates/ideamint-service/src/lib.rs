//! Ideamint HTTP API Service.
//!
//! This crate provides the HTTP API for the ideamint marketplace, including:
//!
//! - Account registration with signup and referral bonuses
//! - Idea submission and moderation
//! - Coin purchases through the payment gateway
//! - Wallet withdrawals with administrator approval
//!
//! # Authentication
//!
//! End-user requests carry an HS256 bearer token whose subject is the
//! account id. Operator endpoints use the `X-Admin-Key` API key. The
//! payment confirmation callback is unauthenticated and relies on its
//! HMAC signature instead.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod notify;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use gateway::{GatewayClient, GatewayError};
pub use notify::{Notifier, TemplateKind};
pub use routes::create_router;
pub use state::AppState;
