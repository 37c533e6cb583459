use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
	model::{Media, Post},
	storage::PostFilters,
};

fn validate_category_id(category_id: &str) -> Result<(), ValidationError> {
	if !category_id.is_empty() && Uuid::parse_str(category_id).is_err() {
		let mut error = ValidationError::new("uuid");
		error.message = Some("categoryId must be a UUID".into());

		return Err(error);
	}

	Ok(())
}

/// Filters for listing posts.
///
/// The flags are only `true` for the exact string `true`; any other value means `false`.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
	/// Only return published (`true`) or unpublished posts.
	pub published: Option<String>,
	/// Only return posts in this category. Ignored when empty.
	#[validate(custom(function = "validate_category_id"))]
	pub category_id: Option<String>,
	/// Only return featured (`true`) or regular posts.
	pub featured: Option<String>,
}

impl PostQuery {
	/// Should only be called after validation, since a malformed category id is
	/// dropped like an empty one.
	pub fn into_filters(self) -> PostFilters {
		PostFilters {
			published: self.published.map(|value| value == "true"),
			category_id: self
				.category_id
				.and_then(|id| Uuid::parse_str(&id).ok()),
			featured: self.featured.map(|value| value == "true"),
		}
	}
}

/// A post along with its media, oldest first.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostWithMedia {
	#[serde(flatten)]
	pub post: Post,
	pub media: Vec<Media>,
}

#[cfg(test)]
mod test {
	use super::*;

	fn query(published: Option<&str>, category_id: Option<&str>, featured: Option<&str>) -> PostQuery {
		PostQuery {
			published: published.map(Into::into),
			category_id: category_id.map(Into::into),
			featured: featured.map(Into::into),
		}
	}

	#[test]
	fn test_flags_are_only_true_for_true() {
		let filters = query(Some("true"), None, Some("yes")).into_filters();

		assert_eq!(filters.published, Some(true));
		assert_eq!(filters.featured, Some(false));

		let filters = query(Some("TRUE"), None, None).into_filters();

		assert_eq!(filters.published, Some(false));
		assert_eq!(filters.featured, None);
	}

	#[test]
	fn test_category_id() {
		let id = Uuid::new_v4();
		let filters = query(None, Some(&id.to_string()), None);

		assert!(filters.validate().is_ok());
		assert_eq!(filters.into_filters().category_id, Some(id));
		assert!(query(None, Some("not-a-uuid"), None).validate().is_err());

		let empty = query(None, Some(""), None);

		assert!(empty.validate().is_ok());
		assert_eq!(empty.into_filters().category_id, None);
	}
}
