use std::sync::Arc;

use axum::extract::State;
use macros::route;

use crate::{extract::Json, mail::Mailer, openapi::tag};

use super::{model, RouteError};

/// Send contact form
/// Validates a contact form submission and emails it to the site owner.
#[route(tag = tag::CONTACT)]
pub async fn send_contact(
	State(mailer): State<Arc<dyn Mailer>>,
	Json(input): Json<model::ContactInput>,
) -> Result<Json<model::ContactResponse>, RouteError> {
	mailer.send(input.to_email()).await.map_err(super::Error::Mail)?;

	tracing::info!(business_needs = %input.business_needs, "relayed contact form");

	Ok(Json(model::ContactResponse {
		success: true,
		message: "Thank you for reaching out! We'll get back to you soon.".into(),
	}))
}
