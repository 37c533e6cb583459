use std::sync::Arc;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	auth,
	config::AdminCredentials,
	error::RouteError,
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_PASSWORD},
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";
pub const PASSWORD_HEADER: &str = "x-admin-password";

/// Proof that the request was made by an administrator.
///
/// Accepts either `Authorization: Bearer <ADMIN_TOKEN>` or
/// `X-Admin-Password: <ADMIN_PASSWORD>`. Anything else is rejected with
/// [`auth::Error::Unauthorized`], before the body is read.
///
/// ```rust
/// async fn route(_: Admin, Json(input): Json<CreatePost>) {
///   // ...
/// }
/// ```
#[derive(Debug)]
pub struct Admin;

#[axum::async_trait]
impl<S> FromRequestParts<S> for Admin
where
	Arc<AdminCredentials>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let credentials = Arc::<AdminCredentials>::from_ref(state);

		let token = parts
			.headers
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX));

		let password = parts
			.headers
			.get(PASSWORD_HEADER)
			.and_then(|value| value.to_str().ok());

		if credentials.accepts(token, password) {
			Ok(Self)
		} else {
			Err(auth::Error::Unauthorized.into())
		}
	}
}

impl OperationInput for Admin {
	/// Operation input for the admin extractor.
	///
	/// This adds the bearer token and password requirements to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_PASSWORD.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}
