use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown category {0}")]
	UnknownCategory(Uuid),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_categories, get_categories_docs)
				.post_with(create_category, create_category_docs),
		)
		.api_route(
			"/:id",
			get_with(get_category, get_category_docs)
				.put_with(update_category, update_category_docs)
				.delete_with(delete_category, delete_category_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownCategory(..) => StatusCode::NOT_FOUND,
		}
	}

	fn message(&self) -> std::borrow::Cow<'static, str> {
		"Category not found".into()
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let Self::UnknownCategory(category) = self;

		error::Message::new("unknown_category")
			.detail("category", category.to_string())
			.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_lists_default_categories() {
		let server = server();

		let response = server.get("/api/blog/categories").await;
		assert_eq!(response.status_code(), StatusCode::OK);

		let categories = response.json::<Vec<Value>>();
		let slugs = categories
			.iter()
			.map(|category| category["slug"].as_str().unwrap())
			.collect::<Vec<_>>();

		assert_eq!(slugs, ["industry-insights", "innovation", "technology"]);
	}

	#[tokio::test]
	async fn test_category_lifecycle() {
		let server = server();

		let response = server
			.post("/api/blog/categories")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({
				"name": "Robotics",
				"slug": "robotics",
				"description": "Arms and wheels",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);

		let category = response.json::<Value>();
		let id = category["id"].as_str().unwrap().to_owned();

		assert_eq!(category["color"], "#3B82F6");
		assert!(category["createdAt"].is_string());

		let response = server.get(&format!("/api/blog/categories/{id}")).await;
		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["name"], "Robotics");

		let response = server
			.put(&format!("/api/blog/categories/{id}"))
			.add_header(PASSWORD.0, PASSWORD.1)
			.json(&json!({ "color": "#FF0000" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["color"], "#FF0000");
		assert_eq!(response.json::<Value>()["description"], "Arms and wheels");

		let response = server
			.delete(&format!("/api/blog/categories/{id}"))
			.add_header(BEARER.0, BEARER.1)
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(
			response.json::<Value>(),
			json!({ "message": "Category deleted successfully" })
		);

		let response = server
			.get(&format!("/api/blog/categories/{id}"))
			.await;
		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

		let response = server
			.delete(&format!("/api/blog/categories/{id}"))
			.add_header(BEARER.0, BEARER.1)
			.await;
		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_duplicate_category_is_a_conflict() {
		let server = server();
		let body = json!({ "name": "Robotics", "slug": "robotics" });

		let response = server
			.post("/api/blog/categories")
			.add_header(BEARER.0, BEARER.1)
			.json(&body)
			.await;
		assert_eq!(response.status_code(), StatusCode::CREATED);

		let response = server
			.post("/api/blog/categories")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({ "name": "Robotics", "slug": "robotics-2" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::CONFLICT);
		assert_eq!(
			response.json::<Value>()["error"],
			"category name already exists"
		);

		let count = server
			.get("/api/blog/categories")
			.await
			.json::<Vec<Value>>()
			.iter()
			.filter(|category| category["name"] == "Robotics")
			.count();

		assert_eq!(count, 1);
	}

	#[tokio::test]
	async fn test_invalid_category_is_rejected() {
		let server = server();

		let fields = |body: Value| {
			body["details"]
				.as_array()
				.unwrap()
				.iter()
				.map(|detail| detail["field"].as_str().unwrap().to_owned())
				.collect::<Vec<_>>()
		};

		// Lengths are part of the body schema, so they are reported first.
		let response = server
			.post("/api/blog/categories")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({ "name": "", "slug": "Not A Slug", "color": "blue" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(fields(response.json::<Value>()), ["name"]);

		let response = server
			.post("/api/blog/categories")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({ "name": "Rust", "slug": "Not A Slug", "color": "blue" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(fields(response.json::<Value>()), ["color", "slug"]);
		assert_eq!(server.get("/api/blog/categories").await.json::<Vec<Value>>().len(), 3);
	}

	#[tokio::test]
	async fn test_mutations_require_admin() {
		let server = server();

		let response = server
			.post("/api/blog/categories")
			.json(&json!({ "name": "Robotics", "slug": "robotics" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			response.json::<Value>(),
			json!({ "error": "Unauthorized: Admin access required" })
		);

		let technology = server.get("/api/blog/categories").await.json::<Vec<Value>>()[2].clone();
		let id = technology["id"].as_str().unwrap();

		let response = server
			.put(&format!("/api/blog/categories/{id}"))
			.add_header(BEARER.0, HeaderValue::from_static("Bearer wrong"))
			.json(&json!({ "name": "Tech" }))
			.await;
		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let response = server
			.delete(&format!("/api/blog/categories/{id}"))
			.add_header(PASSWORD.0, HeaderValue::from_static("wrong"))
			.await;
		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let response = server.get(&format!("/api/blog/categories/{id}")).await;
		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["name"], "Technology");
	}

	#[tokio::test]
	async fn test_malformed_id_is_a_bad_request() {
		let server = server();
		let response = server.get("/api/blog/categories/not-a-uuid").await;
		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	}
}
