use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Slugs are lowercase ASCII letters, digits and hyphens.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
	if slug
		.chars()
		.any(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
	{
		let mut error = ValidationError::new("slug");
		error.message = Some("slug must only contain lowercase letters, digits and hyphens".into());

		return Err(error);
	}

	Ok(())
}

/// Derives a slug from a title.
///
/// The title is lowercased, everything but ASCII letters, digits, whitespace
/// and hyphens is dropped, and whitespace runs become single hyphens.
/// A title with nothing left becomes `post`.
pub fn slugify(title: &str) -> String {
	let cleaned = title
		.to_lowercase()
		.chars()
		.filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
		.collect::<String>();

	let slug = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
	let slug = slug.trim_matches('-');

	if slug.is_empty() {
		"post".into()
	} else {
		slug.into()
	}
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
	let valid = color.len() == 7
		&& color.starts_with('#')
		&& color[1..].chars().all(|c| c.is_ascii_hexdigit());

	if !valid {
		let mut error = ValidationError::new("color");
		error.message = Some("color must be a hex color such as #3B82F6".into());

		return Err(error);
	}

	Ok(())
}

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn default_read_time() -> i32 {
	5
}

/// A user that can author posts.
///
/// The password is never serialized.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The unique username of the user.
	pub username: String,
	/// Argon2 hash of the password, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The creation time of the user.
	pub created_at: DateTime<Utc>,
}

/// A user about to be inserted.
///
/// The id is chosen by the caller since the password hash is salted with it.
#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub username: String,
	pub password: Vec<u8>,
}

/// A blog category, used to group posts.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
	/// The unique identifier of the category.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The unique display name of the category.
	#[validate(length(min = 1, max = 64))]
	pub name: String,
	/// The unique URL-safe name of the category.
	#[validate(length(min = 1, max = 64), custom(function = "validate_slug"))]
	pub slug: String,
	/// A short description of the category.
	#[validate(length(max = 512))]
	pub description: Option<String>,
	/// The accent color of the category, as `#RRGGBB`.
	#[validate(custom(function = "validate_color"))]
	pub color: Option<String>,
	/// The creation time of the category.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

/// A single blog post.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The title of the post.
	#[validate(length(min = 1, max = 200))]
	pub title: String,
	/// The unique URL-safe name of the post. Derived from the title when omitted.
	#[model(optional)]
	#[validate(length(min = 1, max = 200), custom(function = "validate_slug"))]
	pub slug: String,
	/// A short summary shown in post listings.
	#[validate(length(min = 1, max = 1000))]
	pub excerpt: String,
	/// The content of the post.
	#[validate(length(min = 1))]
	pub content: String,
	/// The URL of the cover image.
	pub cover_image: Option<String>,
	/// The category the post belongs to.
	pub category_id: Option<Uuid>,
	/// The user that wrote the post.
	pub author_id: Uuid,
	/// Whether the post is publicly listed.
	#[serde(default)]
	pub published: bool,
	/// Whether the post is highlighted, independent of `published`.
	#[serde(default)]
	pub featured_post: bool,
	/// The estimated reading time, in minutes.
	#[serde(default = "default_read_time")]
	#[validate(range(min = 1, max = 600))]
	pub read_time: i32,
	/// The number of times the post was read. Only ever increases.
	#[serde(skip_deserializing)]
	pub view_count: i32,
	/// Free-form tags, in display order.
	#[serde(default)]
	#[validate(length(max = 32))]
	pub tags: Vec<String>,
	#[validate(length(max = 200))]
	pub meta_title: Option<String>,
	#[validate(length(max = 500))]
	pub meta_description: Option<String>,
	pub social_image: Option<String>,
	/// The time the post was first published.
	#[serde(skip_deserializing)]
	pub published_at: Option<DateTime<Utc>>,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	/// The last modification time of the post.
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

/// The kind of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
	Image,
	Video,
	Document,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown media kind {0:?}")]
pub struct UnknownMediaKind(String);

impl MediaKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Image => "image",
			Self::Video => "video",
			Self::Document => "document",
		}
	}
}

impl TryFrom<String> for MediaKind {
	type Error = UnknownMediaKind;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		match value.as_str() {
			"image" => Ok(Self::Image),
			"video" => Ok(Self::Video),
			"document" => Ok(Self::Document),
			_ => Err(UnknownMediaKind(value)),
		}
	}
}

/// An image, video or document attached to a post.
#[model(skip_update)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Media {
	/// The unique identifier of the media item.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The post the media item belongs to.
	pub blog_post_id: Uuid,
	/// The kind of media.
	#[serde(rename = "type")]
	#[sqlx(try_from = "String")]
	pub kind: MediaKind,
	/// Where the media item is served from.
	#[validate(length(min = 1, max = 2048))]
	pub url: String,
	pub title: Option<String>,
	pub description: Option<String>,
	/// Alternative text for images.
	pub alt_text: Option<String>,
	/// The size of the file, in bytes.
	#[validate(range(min = 0))]
	pub file_size: Option<i32>,
	pub mime_type: Option<String>,
	#[validate(range(min = 1))]
	pub width: Option<i32>,
	#[validate(range(min = 1))]
	pub height: Option<i32>,
	/// The creation time of the media item.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	#[test]
	fn test_validate_slug() {
		assert!(validate_slug("hello-world-2").is_ok());
		assert!(validate_slug("Hello").is_err());
		assert!(validate_slug("hello world").is_err());
		assert!(validate_slug("héllo").is_err());
	}

	#[test]
	fn test_slugify() {
		assert_eq!(slugify("Hello World!"), "hello-world");
		assert_eq!(slugify("  Rust   & AI:  a Primer "), "rust-ai-a-primer");
		assert_eq!(slugify("Top 10 IoT-Ready Boards"), "top-10-iot-ready-boards");
		assert_eq!(slugify("Café Résumé"), "caf-rsum");
		assert_eq!(slugify("!!!"), "post");
	}

	#[test]
	fn test_slugify_output_is_a_valid_slug() {
		for title in ["Hello World!", "- dashes -", "tabs	and
newlines", "日本語 title"] {
			let slug = slugify(title);

			assert!(!slug.is_empty());
			assert!(validate_slug(&slug).is_ok(), "{slug:?} is not a valid slug");
		}
	}

	#[test]
	fn test_validate_color() {
		assert!(validate_color("#3B82F6").is_ok());
		assert!(validate_color("#10b981").is_ok());
		assert!(validate_color("3B82F6").is_err());
		assert!(validate_color("#3B82F").is_err());
		assert!(validate_color("#GGGGGG").is_err());
	}

	#[test]
	fn test_create_post_defaults() {
		let input: CreatePost = serde_json::from_value(serde_json::json!({
			"title": "Hello World!",
			"excerpt": "...",
			"content": "...",
			"authorId": Uuid::new_v4(),
		}))
		.unwrap();

		assert_eq!(input.slug, None);
		assert!(!input.published);
		assert!(!input.featured_post);
		assert_eq!(input.read_time, 5);
		assert!(input.tags.is_empty());
		assert!(input.validate().is_ok());
	}

	#[test]
	fn test_update_post_leaves_absent_fields() {
		let input: UpdatePost = serde_json::from_value(serde_json::json!({
			"published": true,
		}))
		.unwrap();

		assert_eq!(input.published, Some(true));
		assert_eq!(input.title, None);
		assert_eq!(input.read_time, None);
		assert_eq!(input.cover_image, None);
	}

	#[test]
	fn test_create_media_kind() {
		let input: CreateMedia = serde_json::from_value(serde_json::json!({
			"blogPostId": Uuid::new_v4(),
			"type": "video",
			"url": "https://cdn.example.com/demo.mp4",
		}))
		.unwrap();

		assert_eq!(input.kind, MediaKind::Video);
		assert!(serde_json::from_value::<CreateMedia>(serde_json::json!({
			"blogPostId": Uuid::new_v4(),
			"type": "audio",
			"url": "https://cdn.example.com/demo.mp3",
		}))
		.is_err());
	}

	#[test]
	fn test_media_kind_from_column() {
		assert_eq!(
			MediaKind::try_from("document".to_owned()).unwrap(),
			MediaKind::Document
		);
		assert!(MediaKind::try_from("audio".to_owned()).is_err());
	}
}
