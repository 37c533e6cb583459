//! PostgreSQL storage backend.
//!
//! Uniqueness and references are enforced by the constraints in
//! `migrations/`; violations are mapped back to [`Error`] by constraint name.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{Error, PostFilters, Storage, DEFAULT_CATEGORIES, POST_SLUG};
use crate::model::{
	self, Category, CreateCategory, CreateMedia, CreatePost, Media, NewUser, Post,
	UpdateCategory, UpdatePost, User,
};

/// Maps constraint violations to their storage error, leaving other errors as-is.
fn map_constraint(error: sqlx::Error) -> Error {
	let sqlx::Error::Database(ref database) = error else {
		return Error::Database(error);
	};

	match database.constraint() {
		Some("users_username_key" | "users_pkey") => Error::Conflict("username"),
		Some("blog_categories_name_key") => Error::Conflict("category name"),
		Some("blog_categories_slug_key") => Error::Conflict("category slug"),
		Some("blog_posts_slug_key") => Error::Conflict(POST_SLUG),
		Some("blog_posts_author_id_fkey") => Error::MissingReference("author"),
		Some("blog_posts_category_id_fkey") => Error::MissingReference("category"),
		Some("blog_media_blog_post_id_fkey") => Error::MissingReference("post"),
		_ => Error::Database(error),
	}
}

/// PostgreSQL storage backend.
#[derive(Clone)]
pub struct PgStorage {
	pool: PgPool,
}

impl PgStorage {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Connects to the database and runs pending migrations.
	pub async fn connect(url: &str) -> Result<Self, Error> {
		let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;

		sqlx::migrate!("./migrations")
			.run(&pool)
			.await
			.map_err(|error| Error::Database(error.into()))?;

		Ok(Self::new(pool))
	}
}

#[async_trait]
impl Storage for PgStorage {
	async fn get_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1"#)
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO users (id, username, password)
				VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(user.username)
		.bind(user.password)
		.fetch_one(&self.pool)
		.await
		.map_err(map_constraint)
	}

	async fn get_all_categories(&self) -> Result<Vec<Category>, Error> {
		let categories = sqlx::query_as::<_, Category>(
			r#"
				SELECT * FROM blog_categories
				ORDER BY created_at, name
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(categories)
	}

	async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Error> {
		let category =
			sqlx::query_as::<_, Category>(r#"SELECT * FROM blog_categories WHERE id = $1"#)
				.bind(id)
				.fetch_optional(&self.pool)
				.await?;

		Ok(category)
	}

	async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, Error> {
		let category =
			sqlx::query_as::<_, Category>(r#"SELECT * FROM blog_categories WHERE slug = $1"#)
				.bind(slug)
				.fetch_optional(&self.pool)
				.await?;

		Ok(category)
	}

	async fn create_category(&self, category: CreateCategory) -> Result<Category, Error> {
		sqlx::query_as::<_, Category>(
			r#"
				INSERT INTO blog_categories (name, slug, description, color)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(category.name)
		.bind(category.slug)
		.bind(category.description)
		.bind(
			category
				.color
				.unwrap_or_else(|| model::DEFAULT_COLOR.to_owned()),
		)
		.fetch_one(&self.pool)
		.await
		.map_err(map_constraint)
	}

	async fn update_category(
		&self,
		id: Uuid,
		category: UpdateCategory,
	) -> Result<Option<Category>, Error> {
		sqlx::query_as::<_, Category>(
			r#"
				UPDATE blog_categories
				SET
					name = COALESCE($1, name),
					slug = COALESCE($2, slug),
					description = COALESCE($3, description),
					color = COALESCE($4, color)
				WHERE id = $5
				RETURNING *
			"#,
		)
		.bind(category.name)
		.bind(category.slug)
		.bind(category.description)
		.bind(category.color)
		.bind(id)
		.fetch_optional(&self.pool)
		.await
		.map_err(map_constraint)
	}

	async fn delete_category(&self, id: Uuid) -> Result<bool, Error> {
		let status = sqlx::query(r#"DELETE FROM blog_categories WHERE id = $1"#)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn get_all_posts(&self, filters: PostFilters) -> Result<Vec<Post>, Error> {
		let posts = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM blog_posts
				WHERE ($1::BOOLEAN IS NULL OR published = $1)
					AND ($2::UUID IS NULL OR category_id = $2)
					AND ($3::BOOLEAN IS NULL OR featured_post = $3)
				ORDER BY created_at DESC
			"#,
		)
		.bind(filters.published)
		.bind(filters.category_id)
		.bind(filters.featured)
		.fetch_all(&self.pool)
		.await?;

		Ok(posts)
	}

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let post = sqlx::query_as::<_, Post>(r#"SELECT * FROM blog_posts WHERE id = $1"#)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, Error> {
		let post = sqlx::query_as::<_, Post>(r#"SELECT * FROM blog_posts WHERE slug = $1"#)
			.bind(slug)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn create_post(&self, post: CreatePost) -> Result<Post, Error> {
		let slug = post.slug.unwrap_or_else(|| model::slugify(&post.title));

		sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO blog_posts (
					title, slug, excerpt, content, cover_image, category_id, author_id,
					published, featured_post, read_time, tags,
					meta_title, meta_description, social_image, published_at
				)
				VALUES (
					$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
					CASE WHEN $8 THEN now() END
				)
				RETURNING *
			"#,
		)
		.bind(post.title)
		.bind(slug)
		.bind(post.excerpt)
		.bind(post.content)
		.bind(post.cover_image)
		.bind(post.category_id)
		.bind(post.author_id)
		.bind(post.published)
		.bind(post.featured_post)
		.bind(post.read_time)
		.bind(post.tags)
		.bind(post.meta_title)
		.bind(post.meta_description)
		.bind(post.social_image)
		.fetch_one(&self.pool)
		.await
		.map_err(map_constraint)
	}

	async fn update_post(&self, id: Uuid, post: UpdatePost) -> Result<Option<Post>, Error> {
		// Column references on the right-hand side see the row before the update.
		sqlx::query_as::<_, Post>(
			r#"
				UPDATE blog_posts
				SET
					title = COALESCE($1, title),
					slug = COALESCE($2, slug),
					excerpt = COALESCE($3, excerpt),
					content = COALESCE($4, content),
					cover_image = COALESCE($5, cover_image),
					category_id = COALESCE($6, category_id),
					author_id = COALESCE($7, author_id),
					published = COALESCE($8, published),
					featured_post = COALESCE($9, featured_post),
					read_time = COALESCE($10, read_time),
					tags = COALESCE($11, tags),
					meta_title = COALESCE($12, meta_title),
					meta_description = COALESCE($13, meta_description),
					social_image = COALESCE($14, social_image),
					published_at = CASE
						WHEN $8 IS TRUE AND NOT published THEN now()
						ELSE published_at
					END,
					updated_at = now()
				WHERE id = $15
				RETURNING *
			"#,
		)
		.bind(post.title)
		.bind(post.slug)
		.bind(post.excerpt)
		.bind(post.content)
		.bind(post.cover_image)
		.bind(post.category_id)
		.bind(post.author_id)
		.bind(post.published)
		.bind(post.featured_post)
		.bind(post.read_time)
		.bind(post.tags)
		.bind(post.meta_title)
		.bind(post.meta_description)
		.bind(post.social_image)
		.bind(id)
		.fetch_optional(&self.pool)
		.await
		.map_err(map_constraint)
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool, Error> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(r#"DELETE FROM blog_media WHERE blog_post_id = $1"#)
			.bind(id)
			.execute(&mut *tx)
			.await?;

		let status = sqlx::query(r#"DELETE FROM blog_posts WHERE id = $1"#)
			.bind(id)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(status.rows_affected() > 0)
	}

	async fn increment_view_count(&self, id: Uuid) -> Result<(), Error> {
		// Saturates at the INTEGER maximum, like the memory backend.
		sqlx::query(
			r#"UPDATE blog_posts SET view_count = view_count + 1 WHERE id = $1 AND view_count < 2147483647"#,
		)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn get_media_by_post_id(&self, post_id: Uuid) -> Result<Vec<Media>, Error> {
		let media = sqlx::query_as::<_, Media>(
			r#"
				SELECT * FROM blog_media
				WHERE blog_post_id = $1
				ORDER BY created_at
			"#,
		)
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(media)
	}

	async fn create_media(&self, media: CreateMedia) -> Result<Media, Error> {
		sqlx::query_as::<_, Media>(
			r#"
				INSERT INTO blog_media (
					blog_post_id, kind, url, title, description, alt_text,
					file_size, mime_type, width, height
				)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
				RETURNING *
			"#,
		)
		.bind(media.blog_post_id)
		.bind(media.kind.as_str())
		.bind(media.url)
		.bind(media.title)
		.bind(media.description)
		.bind(media.alt_text)
		.bind(media.file_size)
		.bind(media.mime_type)
		.bind(media.width)
		.bind(media.height)
		.fetch_one(&self.pool)
		.await
		.map_err(map_constraint)
	}

	async fn delete_media(&self, id: Uuid) -> Result<bool, Error> {
		let status = sqlx::query(r#"DELETE FROM blog_media WHERE id = $1"#)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn seed_default_categories(&self) -> Result<(), Error> {
		let mut tx = self.pool.begin().await?;

		// Serializes concurrent seeders; the count below is otherwise racy.
		sqlx::query(r#"LOCK TABLE blog_categories IN SHARE ROW EXCLUSIVE MODE"#)
			.execute(&mut *tx)
			.await?;

		let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM blog_categories"#)
			.fetch_one(&mut *tx)
			.await?;

		if count == 0 {
			for (name, slug, description, color) in DEFAULT_CATEGORIES {
				sqlx::query(
					r#"
						INSERT INTO blog_categories (name, slug, description, color)
						VALUES ($1, $2, $3, $4)
					"#,
				)
				.bind(name)
				.bind(slug)
				.bind(description)
				.bind(color)
				.execute(&mut *tx)
				.await?;
			}

			tracing::info!("seeded {} default categories", DEFAULT_CATEGORIES.len());
		}

		tx.commit().await?;

		Ok(())
	}
}
