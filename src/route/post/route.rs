use std::sync::Arc;

use axum::extract::State;
use chrono::Utc;
use macros::route;

use crate::{
	extract::{Admin, Created, Json, Path, Query},
	model::{self as entity, CreatePost, Media, Post, UpdatePost},
	openapi::tag,
	route::{Deleted, PostIdInput, PostSlugInput},
	storage::{self, Storage, POST_SLUG},
};

use super::{model, Error, RouteError};

/// How many slugs are tried before a conflict is reported.
const SLUG_ATTEMPTS: u32 = 5;

/// List posts
/// Returns the posts matching the filters, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(storage): State<Arc<dyn Storage>>,
	Query(query): Query<model::PostQuery>,
) -> Result<Json<Vec<Post>>, RouteError> {
	Ok(Json(storage.get_all_posts(query.into_filters()).await?))
}

/// Read post
/// Returns a post by its slug along with its media, and counts the read as a view.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(storage): State<Arc<dyn Storage>>,
	Path(PostSlugInput { slug }): Path<PostSlugInput>,
) -> Result<Json<model::PostWithMedia>, RouteError> {
	let Some(mut post) = storage.get_post_by_slug(&slug).await? else {
		return Err(Error::UnknownSlug(slug).into());
	};

	storage.increment_view_count(post.id).await?;
	post.view_count = post.view_count.saturating_add(1);

	let media = storage.get_media_by_post_id(post.id).await?;

	Ok(Json(model::PostWithMedia { post, media }))
}

/// Create post
/// Creates a new post. Without a slug, one is derived from the title. A slug
/// that is already taken gets a timestamp suffix.
#[route(tag = tag::POST, response(status = 201, description = "Created the post.", shape = "Json<Post>"))]
pub async fn create_post(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Json(mut input): Json<CreatePost>,
) -> Result<Created<Post>, RouteError> {
	let slug = input
		.slug
		.take()
		.unwrap_or_else(|| entity::slugify(&input.title));

	let mut stamp = None;

	if storage.get_post_by_slug(&slug).await?.is_some() {
		stamp = Some(Utc::now().timestamp_millis());
	}

	let mut attempts = 1;

	// Another post can take the same slug between the check and the insert.
	let post = loop {
		input.slug = Some(match stamp {
			Some(stamp) => format!("{slug}-{stamp}"),
			None => slug.clone(),
		});

		match storage.create_post(input.clone()).await {
			Err(storage::Error::Conflict(POST_SLUG)) if attempts < SLUG_ATTEMPTS => {
				attempts += 1;

				let now = Utc::now().timestamp_millis();
				stamp = Some(stamp.map_or(now, |last: i64| now.max(last + 1)));
			}
			result => break result?,
		}
	};

	tracing::info!(id = %post.id, slug = %post.slug, "created post");

	Ok(Created(post))
}

/// Update post
/// Updates the fields of a post that are present in the body. Publishing an
/// unpublished post sets its publication time.
#[route(tag = tag::POST)]
pub async fn update_post(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Path(PostIdInput { id }): Path<PostIdInput>,
	Json(input): Json<UpdatePost>,
) -> Result<Json<Post>, RouteError> {
	let post = storage.update_post(id, input).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(id))?))
}

/// Delete post
/// Deletes a post along with its media.
#[route(tag = tag::POST)]
pub async fn delete_post(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Path(PostIdInput { id }): Path<PostIdInput>,
) -> Result<Json<Deleted>, RouteError> {
	if !storage.delete_post(id).await? {
		return Err(Error::UnknownPost(id).into());
	}

	tracing::info!(%id, "deleted post");

	Ok(Json(Deleted::new("Blog post deleted successfully")))
}

/// List post media
/// Returns the media of a post, oldest first. Unknown posts have no media.
#[route(tag = tag::POST)]
pub async fn get_post_media(
	State(storage): State<Arc<dyn Storage>>,
	Path(PostIdInput { id }): Path<PostIdInput>,
) -> Result<Json<Vec<Media>>, RouteError> {
	Ok(Json(storage.get_media_by_post_id(id).await?))
}
