use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, mail, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The message is passed on to the client as-is.
	#[error("{0}")]
	Mail(#[from] mail::Error),
}

type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/", post_with(send_contact, send_contact_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Mail(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}
