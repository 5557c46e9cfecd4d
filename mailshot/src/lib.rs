//! Bulk email campaigns over a rate-limited SMTP provider.
//!
//! - [`mail`]: the transport seam ([`mail::Mailer`], lettre-backed
//!   [`mail::SmtpMailer`]) and the retry controller.
//! - [`campaign`]: personalization and the three send paths, including the
//!   tracked, pausable bulk dispatcher.
//! - [`jobs`]: bulk job records and the store they live in.
//! - [`api`]: the axum JSON API, [`serve`] runs it.

pub mod api;
pub mod campaign;
pub mod config;
pub mod error;
pub mod jobs;
pub mod mail;
mod serve;

pub use config::EnvConfig;
pub use error::CampaignError;
pub use serve::{serve, shutdown_signal};
