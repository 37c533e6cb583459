use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::AppError;

pub type Config = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// 10 requests per second per peer IP, with bursts of up to 50.
///
/// Returns `None` if the quota is invalid, which only happens for a zero period or burst.
pub fn default() -> Option<Arc<Config>> {
	GovernorConfigBuilder::default()
		.per_second(10)
		.burst_size(50)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	let (error, headers) = match error {
		GovernorError::TooManyRequests { wait_time, headers } => {
			(AppError::RateLimited(wait_time), headers)
		}
		GovernorError::UnableToExtractKey => (
			AppError::RateLimiter("unable to extract the client address".into()),
			None,
		),
		GovernorError::Other { msg, headers, .. } => (
			AppError::RateLimiter(msg.unwrap_or_else(|| "unknown error".into())),
			headers,
		),
	};

	let mut response = error.into_response();

	if let Some(headers) = headers {
		response.headers_mut().extend(headers);
	}

	response
}

/// Periodically drops limiter state for clients that have not been seen recently.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}

#[cfg(test)]
mod test {
	use axum::http::{HeaderMap, HeaderValue, StatusCode};

	use super::*;

	#[test]
	fn test_default_quota_is_valid() {
		assert!(default().is_some());
	}

	#[test]
	fn test_too_many_requests_keeps_headers() {
		let mut headers = HeaderMap::new();
		headers.insert("retry-after", HeaderValue::from_static("3"));

		let response = error_handler(GovernorError::TooManyRequests {
			wait_time: 3,
			headers: Some(headers),
		});

		assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(response.headers()["retry-after"], "3");
	}

	#[test]
	fn test_missing_peer_address_is_a_server_error() {
		let response = error_handler(GovernorError::UnableToExtractKey);

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
