use std::borrow::Cow;

use aide::{
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationOutput,
};
use axum::{
	extract::rejection::{PathRejection, QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::storage;

pub type Map = serde_json::Map<String, Value>;

const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// A single error message, optionally tied to an input field.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	pub content: Cow<'a, str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn content(mut self, content: impl Into<Cow<'a, str>>) -> Self {
		self.content = content.into();
		self
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());

		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
	/// A human-readable description of what went wrong.
	pub error: Cow<'static, str>,
	/// Individual problems, such as one per invalid field.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub details: Vec<Message<'static>>,
}

/// Describes how an error is presented to the client.
///
/// Implemented by the error enum of each route module. The [`std::fmt::Display`]
/// output is only used for the default [`ErrorShape::message`] and for logs.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn message(&self) -> Cow<'static, str> {
		self.to_string().into()
	}

	fn into_errors(self) -> Vec<Message<'static>>
	where
		Self: Sized,
	{
		Vec::new()
	}
}

/// Errors raised by the extractors, before a handler runs.
///
/// The messages are presented to the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation failed")]
	Validation(#[from] validator::ValidationErrors),
	#[error("{}", body_error(.0))]
	Json(JsonSchemaRejection),
	#[error("{}", .0.body_text())]
	Query(#[from] QueryRejection),
	#[error("{}", .0.body_text())]
	Path(#[from] PathRejection),
	#[error("too many requests, retry after {0} seconds")]
	RateLimited(u64),
	#[error("rate limiter failure: {0}")]
	RateLimiter(String),
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Query(..) | Self::Path(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::RateLimited(..) => StatusCode::TOO_MANY_REQUESTS,
			Self::RateLimiter(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn into_errors(self) -> Vec<Message<'static>> {
		let errors = match self {
			Self::Validation(errors) => errors,
			Self::Json(rejection) => return body_errors(rejection),
			_ => return Vec::new(),
		};

		let mut messages = errors
			.field_errors()
			.into_iter()
			.flat_map(|(field, errors)| {
				let field = camel_case(&field.to_string());

				errors.iter().map(move |error| {
					let content = error
						.message
						.clone()
						.unwrap_or_else(|| error.code.clone());

					let mut message = Message::new(content).field(field.clone());

					for (key, value) in &error.params {
						if key != "value" {
							message = message.detail(key.to_string(), value.clone());
						}
					}

					message
				})
			})
			.collect::<Vec<_>>();

		messages.sort_by(|a, b| a.field.cmp(&b.field));
		messages
	}
}

fn body_error(rejection: &JsonSchemaRejection) -> String {
	match rejection {
		JsonSchemaRejection::Json(rejection) => rejection.body_text(),
		JsonSchemaRejection::Serde(..) | JsonSchemaRejection::Schema(..) => "validation failed".into(),
	}
}

/// Lists what is wrong with a JSON body, one message per problem.
///
/// Fields are named by their path in the body, like `tags.0`. A missing
/// property is reported on the property itself rather than on its parent.
fn body_errors(rejection: JsonSchemaRejection) -> Vec<Message<'static>> {
	let mut messages = match rejection {
		JsonSchemaRejection::Json(..) => return Vec::new(),
		JsonSchemaRejection::Serde(error) => {
			let path = error.path().to_string();
			let message = Message::new("invalid").detail("message", error.inner().to_string());

			if path == "." {
				message.into_vec()
			} else {
				message.field(path).into_vec()
			}
		}
		JsonSchemaRejection::Schema(units) => units
			.into_iter()
			.map(|unit| {
				let keyword_location = unit.keyword_location().to_string();
				let keyword = keyword_location.rsplit('/').next().unwrap_or_default().to_owned();
				let description = unit.error_description().to_string();

				let mut segments = unit
					.instance_location()
					.to_string()
					.split('/')
					.filter(|segment| !segment.is_empty())
					.map(str::to_owned)
					.collect::<Vec<_>>();

				// `"excerpt" is a required property`
				if keyword == "required" {
					if let Some(property) = description.split('"').nth(1) {
						segments.push(property.to_owned());
					}
				}

				let message = Message::new(keyword).detail("message", description);

				if segments.is_empty() {
					message
				} else {
					message.field(segments.join("."))
				}
			})
			.collect(),
	};

	messages.sort_by(|a, b| a.field.cmp(&b.field));
	messages
}

/// Field names are reported the way they appear in the JSON, not in Rust.
fn camel_case(field: &str) -> String {
	let mut parts = field.split('_');
	let mut camel = parts.next().unwrap_or_default().to_owned();

	for part in parts {
		let mut chars = part.chars();

		if let Some(first) = chars.next() {
			camel.extend(first.to_uppercase());
			camel.push_str(chars.as_str());
		}
	}

	camel
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();
		let message = self.to_string();

		respond(status, &message, message.clone().into(), self.into_errors())
	}
}

impl OperationOutput for AppError {
	type Inner = ErrorBody;

	fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
		Json::<ErrorBody>::operation_response(ctx, operation)
	}
}

/// Builds the response for an error, logging it if it is the server's fault.
fn respond(
	status: StatusCode,
	error: &dyn std::fmt::Display,
	message: Cow<'static, str>,
	details: Vec<Message<'static>>,
) -> Response {
	if status.is_server_error() {
		tracing::error!(error = %error, "request failed");
	}

	(
		status,
		Json(ErrorBody {
			error: message,
			details,
		}),
	)
		.into_response()
}

/// The error type returned by route handlers.
///
/// `T` is the error enum of the route module; storage and extractor errors
/// convert into it with `?`.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<T: ErrorShape> {
	#[error(transparent)]
	Route(T),
	#[error(transparent)]
	App(#[from] AppError),
	#[error(transparent)]
	Storage(#[from] storage::Error),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(value: T) -> Self {
		Self::Route(value)
	}
}

impl storage::Error {
	/// The message sent to the client. Database errors are only logged.
	pub fn message(&self) -> Cow<'static, str> {
		match self {
			Self::Database(..) => INTERNAL_SERVER_ERROR.into(),
			_ => self.to_string().into(),
		}
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response {
		let status = self.status();

		match self {
			Self::Route(error) => {
				let message = error.message();
				respond(status, &error.to_string(), message, error.into_errors())
			}
			Self::App(error) => error.into_response(),
			Self::Storage(error) => respond(status, &error, error.message(), Vec::new()),
		}
	}
}

impl<T: ErrorShape> OperationOutput for RouteError<T> {
	type Inner = ErrorBody;

	fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
		Json::<ErrorBody>::operation_response(ctx, operation)
	}
}

impl<T: ErrorShape> RouteError<T> {
	/// Returns the status code the error responds with.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Route(error) => error.status(),
			Self::App(error) => error.status(),
			Self::Storage(error) => error.status(),
		}
	}
}

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
	#[error("configuration error: {0}")]
	Config(#[from] crate::config::Error),
	#[error("storage error: {0}")]
	Storage(#[from] storage::Error),
	#[error("admin bootstrap failed: {0}")]
	Bootstrap(#[from] crate::auth::BootstrapError),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("tracing setup failed: {0}")]
	Trace(#[from] crate::trace::Error),
}
