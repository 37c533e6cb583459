//! Storage for users and blog content.
//!
//! Defines the [`Storage`] interface that the routes talk to, with two
//! implementations that behave identically: [`MemoryStorage`] (process
//! lifetime, used when no database is configured) and [`PgStorage`].

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::model::{
	Category, CreateCategory, CreateMedia, CreatePost, Media, NewUser, Post, UpdateCategory,
	UpdatePost, User,
};

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Categories created on first start.
///
/// Each entry is `(name, slug, description, color)`.
pub const DEFAULT_CATEGORIES: [(&str, &str, &str, &str); 3] = [
	(
		"Technology",
		"technology",
		"Latest trends in technology and AI",
		"#3B82F6",
	),
	(
		"Innovation",
		"innovation",
		"Breakthrough innovations and case studies",
		"#8B5CF6",
	),
	(
		"Industry Insights",
		"industry-insights",
		"Deep dives into industry trends",
		"#10B981",
	),
];

/// The [`Error::Conflict`] payload for a post slug that is already taken.
pub const POST_SLUG: &str = "post slug";

/// An error returned by a storage backend.
///
/// A missing row is not an error: lookups return `None` and deletes return `false`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A unique field (named by the payload) already holds this value.
	#[error("{0} already exists")]
	Conflict(&'static str),
	/// A referenced row (named by the payload) does not exist.
	#[error("unknown {0}")]
	MissingReference(&'static str),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Conflict(..) => StatusCode::CONFLICT,
			Self::MissingReference(..) => StatusCode::BAD_REQUEST,
			Self::Database(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// Filters for [`Storage::get_all_posts`].
///
/// Every filter that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilters {
	pub published: Option<bool>,
	pub category_id: Option<Uuid>,
	pub featured: Option<bool>,
}

impl PostFilters {
	pub fn matches(&self, post: &Post) -> bool {
		self.published.map_or(true, |p| post.published == p)
			&& self.category_id.map_or(true, |c| post.category_id == Some(c))
			&& self.featured.map_or(true, |f| post.featured_post == f)
	}
}

/// Backend for users, categories, posts and media.
///
/// All backends must be thread-safe (`Send + Sync`) since a single instance
/// is shared by every request.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
	async fn get_user(&self, id: Uuid) -> Result<Option<User>, Error>;

	async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

	/// Inserts a user.
	///
	/// # Errors
	///
	/// Returns [`Error::Conflict`] if the username is taken.
	async fn create_user(&self, user: NewUser) -> Result<User, Error>;

	/// Returns every category, oldest first (ties broken by name).
	async fn get_all_categories(&self) -> Result<Vec<Category>, Error>;

	async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Error>;

	async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, Error>;

	/// Inserts a category. A missing color defaults to [`crate::model::DEFAULT_COLOR`].
	///
	/// # Errors
	///
	/// Returns [`Error::Conflict`] if the name or slug is taken.
	async fn create_category(&self, category: CreateCategory) -> Result<Category, Error>;

	/// Overwrites the fields that are set in `category`.
	///
	/// Returns `Ok(None)` if the category does not exist.
	async fn update_category(
		&self,
		id: Uuid,
		category: UpdateCategory,
	) -> Result<Option<Category>, Error>;

	/// Deletes a category. Posts in it are left without a category.
	///
	/// Returns `Ok(true)` if the category existed.
	async fn delete_category(&self, id: Uuid) -> Result<bool, Error>;

	/// Returns the posts matching `filters`, newest first.
	async fn get_all_posts(&self, filters: PostFilters) -> Result<Vec<Post>, Error>;

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>, Error>;

	async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, Error>;

	/// Inserts a post with a zero view count. `published_at` is set if the
	/// post is created published.
	///
	/// The slug must already be resolved by the caller; a post without one
	/// falls back to a slug derived from the title.
	///
	/// # Errors
	///
	/// Returns [`Error::Conflict`] if the slug is taken, and
	/// [`Error::MissingReference`] if the author or category does not exist.
	async fn create_post(&self, post: CreatePost) -> Result<Post, Error>;

	/// Overwrites the fields that are set in `post` and refreshes `updated_at`.
	///
	/// `published_at` only changes when an unpublished post becomes published.
	/// Returns `Ok(None)` if the post does not exist.
	async fn update_post(&self, id: Uuid, post: UpdatePost) -> Result<Option<Post>, Error>;

	/// Deletes a post along with its media.
	///
	/// Returns `Ok(true)` if the post existed.
	async fn delete_post(&self, id: Uuid) -> Result<bool, Error>;

	/// Adds one to the view count of a post. Does nothing if it does not exist.
	async fn increment_view_count(&self, id: Uuid) -> Result<(), Error>;

	/// Returns the media of a post, oldest first.
	async fn get_media_by_post_id(&self, post_id: Uuid) -> Result<Vec<Media>, Error>;

	/// Inserts a media item.
	///
	/// # Errors
	///
	/// Returns [`Error::MissingReference`] if the post does not exist.
	async fn create_media(&self, media: CreateMedia) -> Result<Media, Error>;

	/// Returns `Ok(true)` if the media item existed.
	async fn delete_media(&self, id: Uuid) -> Result<bool, Error>;

	/// Inserts [`DEFAULT_CATEGORIES`] if there are no categories at all.
	async fn seed_default_categories(&self) -> Result<(), Error>;
}

/// Connects to PostgreSQL if `database_url` is set, otherwise falls back to memory.
///
/// Either way, the default categories are seeded.
pub async fn connect(database_url: Option<&str>) -> Result<Arc<dyn Storage>, Error> {
	let storage: Arc<dyn Storage> = match database_url {
		Some(url) => {
			let storage = PgStorage::connect(url).await?;
			tracing::info!("using postgres storage");

			Arc::new(storage)
		}
		None => {
			tracing::warn!("DATABASE_URL is not set, using in-memory storage");

			Arc::new(MemoryStorage::new())
		}
	};

	storage.seed_default_categories().await?;

	Ok(storage)
}
