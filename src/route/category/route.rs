use std::sync::Arc;

use axum::extract::State;
use macros::route;

use crate::{
	extract::{Admin, Created, Json, Path},
	model::{Category, CreateCategory, UpdateCategory},
	openapi::tag,
	route::{Deleted, IdInput},
	storage::Storage,
};

use super::{Error, RouteError};

/// List categories
/// Returns every category, oldest first.
#[route(tag = tag::CATEGORY)]
pub async fn get_categories(
	State(storage): State<Arc<dyn Storage>>,
) -> Result<Json<Vec<Category>>, RouteError> {
	Ok(Json(storage.get_all_categories().await?))
}

/// Get category
/// Returns a single category by its unique id.
#[route(tag = tag::CATEGORY)]
pub async fn get_category(
	State(storage): State<Arc<dyn Storage>>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<Category>, RouteError> {
	let category = storage.get_category(id).await?;

	Ok(Json(category.ok_or(Error::UnknownCategory(id))?))
}

/// Create category
/// Creates a new category. The name and slug must not be taken.
#[route(tag = tag::CATEGORY, response(status = 201, description = "Created the category.", shape = "Json<Category>"))]
pub async fn create_category(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Json(input): Json<CreateCategory>,
) -> Result<Created<Category>, RouteError> {
	let category = storage.create_category(input).await?;

	tracing::info!(id = %category.id, slug = %category.slug, "created category");

	Ok(Created(category))
}

/// Update category
/// Updates the fields of a category that are present in the body.
#[route(tag = tag::CATEGORY)]
pub async fn update_category(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Path(IdInput { id }): Path<IdInput>,
	Json(input): Json<UpdateCategory>,
) -> Result<Json<Category>, RouteError> {
	let category = storage.update_category(id, input).await?;

	Ok(Json(category.ok_or(Error::UnknownCategory(id))?))
}

/// Delete category
/// Deletes a category. Its posts are kept, without a category.
#[route(tag = tag::CATEGORY)]
pub async fn delete_category(
	_: Admin,
	State(storage): State<Arc<dyn Storage>>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<Deleted>, RouteError> {
	if !storage.delete_category(id).await? {
		return Err(Error::UnknownCategory(id).into());
	}

	tracing::info!(%id, "deleted category");

	Ok(Json(Deleted::new("Category deleted successfully")))
}
