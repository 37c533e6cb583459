//! Configuration, read from the environment once at startup.
//!
//! Empty variables count as unset, so `ADMIN_TOKEN=` in a `.env` file
//! does not enable an empty bearer token.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_FROM_EMAIL: &str = "onboarding@resend.dev";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{key} has an invalid value {value:?}: {reason}")]
	Invalid {
		key: &'static str,
		value: String,
		reason: String,
	},
}

/// The secrets accepted by the [`crate::extract::Admin`] extractor.
///
/// With neither set, no request is an admin request.
#[derive(Debug, Clone, Default)]
pub struct AdminCredentials {
	pub token: Option<String>,
	pub password: Option<String>,
}

impl AdminCredentials {
	/// Returns whether a presented bearer token or password matches a configured secret.
	pub fn accepts(&self, token: Option<&str>, password: Option<&str>) -> bool {
		fn is_match(expected: Option<&String>, given: Option<&str>) -> bool {
			matches!((expected, given), (Some(expected), Some(given)) if expected == given)
		}

		is_match(self.token.as_ref(), token) || is_match(self.password.as_ref(), password)
	}

	/// The password of the admin user created at startup: the admin password,
	/// or the token when only a token is configured.
	pub fn bootstrap_password(&self) -> Option<&str> {
		self.password.as_deref().or(self.token.as_deref())
	}
}

/// Settings for the contact mail relay.
#[derive(Debug, Clone)]
pub struct MailConfig {
	/// The Resend API key. Contact requests fail while it is unset.
	pub api_key: Option<String>,
	pub from: String,
	pub to: String,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// Selects PostgreSQL storage when set, memory storage otherwise.
	pub database_url: Option<String>,
	pub admin: AdminCredentials,
	/// The user created at startup when `ADMIN_PASSWORD` is set.
	pub admin_username: String,
	pub mail: MailConfig,
	/// Enables OpenTelemetry export when set.
	pub otlp_endpoint: Option<String>,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the configuration from any key-value source.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		let host = match get("HOST") {
			Some(value) => value.parse::<IpAddr>().map_err(|e| Error::Invalid {
				key: "HOST",
				reason: e.to_string(),
				value,
			})?,
			None => IpAddr::V4(Ipv4Addr::LOCALHOST),
		};

		let port = match get("PORT") {
			Some(value) => value.parse::<u16>().map_err(|e| Error::Invalid {
				key: "PORT",
				reason: e.to_string(),
				value,
			})?,
			None => DEFAULT_PORT,
		};

		let from = get("RESEND_FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.into());

		Ok(Self {
			host,
			port,
			database_url: get("DATABASE_URL"),
			admin: AdminCredentials {
				token: get("ADMIN_TOKEN"),
				password: get("ADMIN_PASSWORD"),
			},
			admin_username: get("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.into()),
			mail: MailConfig {
				api_key: get("RESEND_API_KEY"),
				to: get("CONTACT_TO_EMAIL").unwrap_or_else(|| from.clone()),
				from,
			},
			otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
		})
	}

	pub fn addr(&self) -> SocketAddr {
		SocketAddr::new(self.host, self.port)
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
		let vars = vars
			.iter()
			.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[]).unwrap();

		assert_eq!(config.addr(), "127.0.0.1:3000".parse().unwrap());
		assert!(config.database_url.is_none());
		assert!(config.admin.token.is_none());
		assert!(config.admin.password.is_none());
		assert_eq!(config.admin_username, "admin");
		assert!(config.mail.api_key.is_none());
		assert_eq!(config.mail.from, "onboarding@resend.dev");
		assert_eq!(config.mail.to, "onboarding@resend.dev");
		assert!(config.otlp_endpoint.is_none());
	}

	#[test]
	fn test_overrides() {
		let config = config(&[
			("HOST", "0.0.0.0"),
			("PORT", "8080"),
			("DATABASE_URL", "postgres://localhost/blog"),
			("ADMIN_TOKEN", "token"),
			("RESEND_FROM_EMAIL", "site@neuralcoder.ai"),
			("CONTACT_TO_EMAIL", "hello@neuralcoder.ai"),
		])
		.unwrap();

		assert_eq!(config.addr(), "0.0.0.0:8080".parse().unwrap());
		assert_eq!(
			config.database_url.as_deref(),
			Some("postgres://localhost/blog")
		);
		assert_eq!(config.admin.token.as_deref(), Some("token"));
		assert_eq!(config.mail.from, "site@neuralcoder.ai");
		assert_eq!(config.mail.to, "hello@neuralcoder.ai");
	}

	#[test]
	fn test_empty_values_are_unset() {
		let config = config(&[("ADMIN_TOKEN", ""), ("PORT", " ")]).unwrap();

		assert!(config.admin.token.is_none());
		assert_eq!(config.port, DEFAULT_PORT);
	}

	#[test]
	fn test_invalid_values() {
		let error = config(&[("PORT", "eighty")]).unwrap_err();
		assert!(matches!(error, Error::Invalid { key: "PORT", .. }));

		let error = config(&[("HOST", "localhost:3000")]).unwrap_err();
		assert!(matches!(error, Error::Invalid { key: "HOST", .. }));
	}

	#[test]
	fn test_admin_credentials() {
		let credentials = AdminCredentials {
			token: Some("token".into()),
			password: Some("hunter2".into()),
		};

		assert!(credentials.accepts(Some("token"), None));
		assert!(credentials.accepts(None, Some("hunter2")));
		assert!(credentials.accepts(Some("wrong"), Some("hunter2")));
		assert!(!credentials.accepts(Some("hunter2"), Some("token")));
		assert!(!credentials.accepts(None, None));

		let unset = AdminCredentials::default();

		assert!(!unset.accepts(Some(""), Some("")));
		assert!(!unset.accepts(None, None));
	}

	#[test]
	fn test_bootstrap_password() {
		let both = AdminCredentials {
			token: Some("token".into()),
			password: Some("hunter2".into()),
		};
		let token_only = AdminCredentials {
			token: Some("token".into()),
			password: None,
		};

		assert_eq!(both.bootstrap_password(), Some("hunter2"));
		assert_eq!(token_only.bootstrap_password(), Some("token"));
		assert_eq!(AdminCredentials::default().bootstrap_password(), None);
	}
}
