use std::borrow::Cow;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

// Reads address a post by slug and writes by id, through the same path
// segment, so both inputs share the `post` parameter name.

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PostIdInput {
	/// The unique identifier of the post.
	#[serde(rename = "post")]
	pub id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PostSlugInput {
	/// The unique URL-safe name of the post.
	#[serde(rename = "post")]
	#[validate(length(min = 1))]
	pub slug: String,
}

/// Confirms that an entity was deleted.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Deleted {
	pub message: Cow<'static, str>,
}

impl Deleted {
	pub fn new(message: &'static str) -> Self {
		Self {
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_post_inputs_share_a_parameter() {
		let id = Uuid::new_v4();

		let input: PostIdInput = serde_json::from_value(json!({ "post": id })).unwrap();
		assert_eq!(input.id, id);

		let input: PostSlugInput = serde_json::from_value(json!({ "post": "hello-world" })).unwrap();
		assert_eq!(input.slug, "hello-world");

		assert!(serde_json::from_value::<PostIdInput>(json!({ "post": "hello-world" })).is_err());
	}
}
