use std::sync::Arc;

use axum::extract::State;
use macros::route;

use crate::{
	extract::{Admin, Created, Json, Path},
	model::{CreateMedia, Media},
	openapi::tag,
	route::{Deleted, IdInput},
	storage::Storage,
};

use super::{Error, RouteError};

/// Attach media
/// Attaches an image, video or document to an existing post.
#[route(tag = tag::MEDIA, response(status = 201, description = "Attached the media.", shape = "Json<Media>"))]
pub async fn create_media(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Json(input): Json<CreateMedia>,
) -> Result<Created<Media>, RouteError> {
	let media = storage.create_media(input).await?;

	tracing::info!(id = %media.id, post = %media.blog_post_id, "attached media");

	Ok(Created(media))
}

/// Delete media
/// Deletes a single media item.
#[route(tag = tag::MEDIA)]
pub async fn delete_media(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<Deleted>, RouteError> {
	if !storage.delete_media(id).await? {
		return Err(Error::UnknownMedia(id).into());
	}

	Ok(Json(Deleted::new("Media deleted successfully")))
}
