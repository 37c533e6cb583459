#![warn(clippy::pedantic)]

mod auth;
mod config;
mod error;
mod extract;
mod mail;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod storage;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{extract::Request, Extension, Router};
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{config::AdminCredentials, error::StartupError, mail::Mailer, storage::Storage};

pub type AppState = State;

/// The shared application state.
///
/// Every field is behind an [`Arc`], so cloning the state per request is cheap.
/// Handlers extract the single field they need through [`axum::extract::FromRef`].
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub storage: Arc<dyn Storage>,
	pub admin: Arc<AdminCredentials>,
	pub mailer: Arc<dyn Mailer>,
}

/// Builds the application, including the documentation under `/docs`.
///
/// Rate limiting is left to the caller, since it needs the peer address.
pub fn router(state: State) -> Router {
	let mut api = OpenApi::default();

	route::routes()
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(CompressionLayer::new())
		.layer(CorsLayer::permissive())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(
			TraceLayer::new_for_http().make_span_with(|request: &Request| {
				let request_id = request
					.headers()
					.get("x-request-id")
					.and_then(|value| value.to_str().ok())
					.unwrap_or_default();

				tracing::info_span!(
					"request",
					method = %request.method(),
					uri = %request.uri(),
					request_id,
				)
			}),
		)
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref())?;

	let storage = storage::connect(config.database_url.as_deref()).await?;

	if let Some(password) = config.admin.bootstrap_password() {
		auth::ensure_admin(
			storage.as_ref(),
			&Argon2::default(),
			&config.admin_username,
			password,
		)
		.await?;
	}

	if config.admin.token.is_none() && config.admin.password.is_none() {
		tracing::warn!("neither ADMIN_TOKEN nor ADMIN_PASSWORD is set, admin routes are disabled");
	}

	if config.mail.api_key.is_none() {
		tracing::warn!("RESEND_API_KEY is not set, contact submissions will fail");
	}

	let state = State {
		storage,
		admin: Arc::new(config.admin.clone()),
		mailer: Arc::new(mail::ResendMailer::new(config.mail.clone())),
	};

	let mut app = router(state);

	if let Some(governor) = ratelimit::default() {
		ratelimit::cleanup_old_limits(&[&governor]);

		app = app.layer(GovernorLayer { config: governor });
	}

	let addr = config.addr();
	let listener = tokio::net::TcpListener::bind(addr).await?;

	tracing::info!(%addr, "listening");

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}
