//! In-memory storage backend.
//!
//! Everything lives in hash maps behind a single lock and is lost when the
//! process exits. Each operation holds the lock for its whole
//! check-then-write sequence, so uniqueness checks cannot race.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Error, PostFilters, Storage, DEFAULT_CATEGORIES, POST_SLUG};
use crate::model::{
	self, Category, CreateCategory, CreateMedia, CreatePost, Media, NewUser, Post,
	UpdateCategory, UpdatePost, User,
};

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	categories: HashMap<Uuid, Category>,
	posts: HashMap<Uuid, Post>,
	media: HashMap<Uuid, Media>,
}

impl Tables {
	/// Returns the field of another category that clashes with `name` or `slug`.
	fn category_taken(
		&self,
		id: Option<Uuid>,
		name: Option<&str>,
		slug: Option<&str>,
	) -> Option<&'static str> {
		self.categories
			.values()
			.filter(|category| Some(category.id) != id)
			.find_map(|category| {
				if name == Some(category.name.as_str()) {
					Some("category name")
				} else if slug == Some(category.slug.as_str()) {
					Some("category slug")
				} else {
					None
				}
			})
	}

	fn post_slug_taken(&self, id: Option<Uuid>, slug: &str) -> bool {
		self.posts
			.values()
			.any(|post| Some(post.id) != id && post.slug == slug)
	}

	fn check_post_references(
		&self,
		author_id: Option<Uuid>,
		category_id: Option<Uuid>,
	) -> Result<(), Error> {
		if author_id.is_some_and(|id| !self.users.contains_key(&id)) {
			return Err(Error::MissingReference("author"));
		}

		if category_id.is_some_and(|id| !self.categories.contains_key(&id)) {
			return Err(Error::MissingReference("category"));
		}

		Ok(())
	}

	fn insert_category(
		&mut self,
		name: String,
		slug: String,
		description: Option<String>,
		color: Option<String>,
		created_at: DateTime<Utc>,
	) -> Category {
		let category = Category {
			id: Uuid::new_v4(),
			name,
			slug,
			description,
			color,
			created_at,
		};

		self.categories.insert(category.id, category.clone());
		category
	}

	/// The defaults share one timestamp, so they list in name order.
	fn seed_default_categories(&mut self) {
		let now = Utc::now();

		for (name, slug, description, color) in DEFAULT_CATEGORIES {
			self.insert_category(
				name.into(),
				slug.into(),
				Some(description.into()),
				Some(color.into()),
				now,
			);
		}
	}
}

/// Overwrites `target` if `value` is set.
fn merge<T>(target: &mut T, value: Option<T>) {
	if let Some(value) = value {
		*target = value;
	}
}

/// Overwrites an optional `target` if `value` is set.
fn merge_option<T>(target: &mut Option<T>, value: Option<T>) {
	if value.is_some() {
		*target = value;
	}
}

/// In-memory storage backend.
///
/// Cheap to construct, so tests build a fresh one each.
pub struct MemoryStorage {
	tables: RwLock<Tables>,
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryStorage {
	/// Creates a store holding only the default categories.
	pub fn new() -> Self {
		let mut tables = Tables::default();
		tables.seed_default_categories();

		Self {
			tables: RwLock::new(tables),
		}
	}
}

#[async_trait]
impl Storage for MemoryStorage {
	async fn get_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		Ok(self.tables.read().await.users.get(&id).cloned())
	}

	async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		Ok(self
			.tables
			.read()
			.await
			.users
			.values()
			.find(|user| user.username == username)
			.cloned())
	}

	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		let mut tables = self.tables.write().await;

		if tables
			.users
			.values()
			.any(|existing| existing.username == user.username || existing.id == user.id)
		{
			return Err(Error::Conflict("username"));
		}

		let user = User {
			id: user.id,
			username: user.username,
			password: user.password,
			created_at: Utc::now(),
		};

		tables.users.insert(user.id, user.clone());
		Ok(user)
	}

	async fn get_all_categories(&self) -> Result<Vec<Category>, Error> {
		let mut categories = self
			.tables
			.read()
			.await
			.categories
			.values()
			.cloned()
			.collect::<Vec<_>>();

		categories.sort_by(|a, b| {
			a.created_at
				.cmp(&b.created_at)
				.then_with(|| a.name.cmp(&b.name))
		});

		Ok(categories)
	}

	async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Error> {
		Ok(self.tables.read().await.categories.get(&id).cloned())
	}

	async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, Error> {
		Ok(self
			.tables
			.read()
			.await
			.categories
			.values()
			.find(|category| category.slug == slug)
			.cloned())
	}

	async fn create_category(&self, category: CreateCategory) -> Result<Category, Error> {
		let mut tables = self.tables.write().await;

		if let Some(field) =
			tables.category_taken(None, Some(category.name.as_str()), Some(category.slug.as_str()))
		{
			return Err(Error::Conflict(field));
		}

		Ok(tables.insert_category(
			category.name,
			category.slug,
			category.description,
			Some(
				category
					.color
					.unwrap_or_else(|| model::DEFAULT_COLOR.to_owned()),
			),
			Utc::now(),
		))
	}

	async fn update_category(
		&self,
		id: Uuid,
		update: UpdateCategory,
	) -> Result<Option<Category>, Error> {
		let mut tables = self.tables.write().await;

		if !tables.categories.contains_key(&id) {
			return Ok(None);
		}

		if let Some(field) =
			tables.category_taken(Some(id), update.name.as_deref(), update.slug.as_deref())
		{
			return Err(Error::Conflict(field));
		}

		let Some(category) = tables.categories.get_mut(&id) else {
			return Ok(None);
		};

		merge(&mut category.name, update.name);
		merge(&mut category.slug, update.slug);
		merge_option(&mut category.description, update.description);
		merge_option(&mut category.color, update.color);

		Ok(Some(category.clone()))
	}

	async fn delete_category(&self, id: Uuid) -> Result<bool, Error> {
		let mut tables = self.tables.write().await;

		if tables.categories.remove(&id).is_none() {
			return Ok(false);
		}

		for post in tables.posts.values_mut() {
			if post.category_id == Some(id) {
				post.category_id = None;
			}
		}

		Ok(true)
	}

	async fn get_all_posts(&self, filters: PostFilters) -> Result<Vec<Post>, Error> {
		let mut posts = self
			.tables
			.read()
			.await
			.posts
			.values()
			.filter(|post| filters.matches(post))
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		Ok(posts)
	}

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		Ok(self.tables.read().await.posts.get(&id).cloned())
	}

	async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, Error> {
		Ok(self
			.tables
			.read()
			.await
			.posts
			.values()
			.find(|post| post.slug == slug)
			.cloned())
	}

	async fn create_post(&self, post: CreatePost) -> Result<Post, Error> {
		let mut tables = self.tables.write().await;
		let slug = post.slug.unwrap_or_else(|| model::slugify(&post.title));

		if tables.post_slug_taken(None, &slug) {
			return Err(Error::Conflict(POST_SLUG));
		}

		tables.check_post_references(Some(post.author_id), post.category_id)?;

		let now = Utc::now();
		let post = Post {
			id: Uuid::new_v4(),
			title: post.title,
			slug,
			excerpt: post.excerpt,
			content: post.content,
			cover_image: post.cover_image,
			category_id: post.category_id,
			author_id: post.author_id,
			published: post.published,
			featured_post: post.featured_post,
			read_time: post.read_time,
			view_count: 0,
			tags: post.tags,
			meta_title: post.meta_title,
			meta_description: post.meta_description,
			social_image: post.social_image,
			published_at: post.published.then_some(now),
			created_at: now,
			updated_at: now,
		};

		tables.posts.insert(post.id, post.clone());
		Ok(post)
	}

	async fn update_post(&self, id: Uuid, update: UpdatePost) -> Result<Option<Post>, Error> {
		let mut tables = self.tables.write().await;

		if !tables.posts.contains_key(&id) {
			return Ok(None);
		}

		if update
			.slug
			.as_deref()
			.is_some_and(|slug| tables.post_slug_taken(Some(id), slug))
		{
			return Err(Error::Conflict(POST_SLUG));
		}

		tables.check_post_references(update.author_id, update.category_id)?;

		let Some(post) = tables.posts.get_mut(&id) else {
			return Ok(None);
		};

		let now = Utc::now();

		if update.published == Some(true) && !post.published {
			post.published_at = Some(now);
		}

		merge(&mut post.title, update.title);
		merge(&mut post.slug, update.slug);
		merge(&mut post.excerpt, update.excerpt);
		merge(&mut post.content, update.content);
		merge_option(&mut post.cover_image, update.cover_image);
		merge_option(&mut post.category_id, update.category_id);
		merge(&mut post.author_id, update.author_id);
		merge(&mut post.published, update.published);
		merge(&mut post.featured_post, update.featured_post);
		merge(&mut post.read_time, update.read_time);
		merge(&mut post.tags, update.tags);
		merge_option(&mut post.meta_title, update.meta_title);
		merge_option(&mut post.meta_description, update.meta_description);
		merge_option(&mut post.social_image, update.social_image);
		post.updated_at = now;

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool, Error> {
		let mut tables = self.tables.write().await;

		tables.media.retain(|_, media| media.blog_post_id != id);

		Ok(tables.posts.remove(&id).is_some())
	}

	async fn increment_view_count(&self, id: Uuid) -> Result<(), Error> {
		if let Some(post) = self.tables.write().await.posts.get_mut(&id) {
			post.view_count = post.view_count.saturating_add(1);
		}

		Ok(())
	}

	async fn get_media_by_post_id(&self, post_id: Uuid) -> Result<Vec<Media>, Error> {
		let mut media = self
			.tables
			.read()
			.await
			.media
			.values()
			.filter(|media| media.blog_post_id == post_id)
			.cloned()
			.collect::<Vec<_>>();

		media.sort_by(|a, b| a.created_at.cmp(&b.created_at));

		Ok(media)
	}

	async fn create_media(&self, media: CreateMedia) -> Result<Media, Error> {
		let mut tables = self.tables.write().await;

		if !tables.posts.contains_key(&media.blog_post_id) {
			return Err(Error::MissingReference("post"));
		}

		let media = Media {
			id: Uuid::new_v4(),
			blog_post_id: media.blog_post_id,
			kind: media.kind,
			url: media.url,
			title: media.title,
			description: media.description,
			alt_text: media.alt_text,
			file_size: media.file_size,
			mime_type: media.mime_type,
			width: media.width,
			height: media.height,
			created_at: Utc::now(),
		};

		tables.media.insert(media.id, media.clone());
		Ok(media)
	}

	async fn delete_media(&self, id: Uuid) -> Result<bool, Error> {
		Ok(self.tables.write().await.media.remove(&id).is_some())
	}

	async fn seed_default_categories(&self) -> Result<(), Error> {
		let mut tables = self.tables.write().await;

		if tables.categories.is_empty() {
			tables.seed_default_categories();
		}

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn test_view_count_saturates() {
		let storage = MemoryStorage::new();
		let author = storage
			.create_user(NewUser {
				id: Uuid::new_v4(),
				username: "author".into(),
				password: Vec::new(),
			})
			.await
			.unwrap();

		let post = storage
			.create_post(
				serde_json::from_value(json!({
					"title": "Popular",
					"excerpt": "...",
					"content": "...",
					"authorId": author.id,
				}))
				.unwrap(),
			)
			.await
			.unwrap();

		storage
			.tables
			.write()
			.await
			.posts
			.get_mut(&post.id)
			.unwrap()
			.view_count = i32::MAX;

		storage.increment_view_count(post.id).await.unwrap();

		assert_eq!(
			storage.get_post(post.id).await.unwrap().unwrap().view_count,
			i32::MAX
		);
	}
}
