//! Outgoing mail.
//!
//! The contact route hands an [`Email`] to a [`Mailer`]; in production that is
//! [`ResendMailer`], which makes one call to the Resend HTTP API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::MailConfig;

pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("RESEND_API_KEY not found in environment variables")]
	MissingApiKey,
	#[error("failed to reach the mail provider: {0}")]
	Request(#[from] reqwest::Error),
	#[error("mail provider rejected the email ({status}): {message}")]
	Provider { status: StatusCode, message: String },
}

/// An email to the site owner. The sender and recipient come from the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
	pub subject: String,
	pub html: String,
	/// Where replies should go, usually the visitor that filled in the form.
	pub reply_to: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
	async fn send(&self, email: Email) -> Result<(), Error>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
	from: &'a str,
	to: [&'a str; 1],
	subject: &'a str,
	html: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct ProviderError {
	message: String,
}

/// Sends mail through the Resend API.
pub struct ResendMailer {
	client: reqwest::Client,
	url: String,
	config: MailConfig,
}

impl ResendMailer {
	pub fn new(config: MailConfig) -> Self {
		Self::with_url(config, RESEND_API_URL)
	}

	pub fn with_url(config: MailConfig, url: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			url: url.into(),
			config,
		}
	}
}

#[async_trait]
impl Mailer for ResendMailer {
	#[tracing::instrument(skip_all, fields(subject = %email.subject))]
	async fn send(&self, email: Email) -> Result<(), Error> {
		// Checked per send so the server still starts without mail configured.
		let api_key = self.config.api_key.as_deref().ok_or(Error::MissingApiKey)?;

		let response = self
			.client
			.post(&self.url)
			.bearer_auth(api_key)
			.json(&SendRequest {
				from: &self.config.from,
				to: [&self.config.to],
				subject: &email.subject,
				html: &email.html,
				reply_to: email.reply_to.as_deref(),
			})
			.send()
			.await?;

		let status = response.status();

		if !status.is_success() {
			let message = match response.json::<ProviderError>().await {
				Ok(error) => error.message,
				Err(..) => status
					.canonical_reason()
					.unwrap_or("unknown error")
					.to_owned(),
			};

			return Err(Error::Provider { status, message });
		}

		tracing::info!("sent email");

		Ok(())
	}
}

/// Escapes text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());

	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}

	escaped
}
