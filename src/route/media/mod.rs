use aide::axum::{
	routing::{delete_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown media {0}")]
	UnknownMedia(Uuid),
}

type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", post_with(create_media, create_media_docs))
		.api_route("/:id", delete_with(delete_media, delete_media_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownMedia(..) => StatusCode::NOT_FOUND,
		}
	}

	fn message(&self) -> std::borrow::Cow<'static, str> {
		"Media not found".into()
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let Self::UnknownMedia(media) = self;

		error::Message::new("unknown_media")
			.detail("media", media.to_string())
			.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn post(server: &TestServer, admin: Uuid) -> String {
		let response = server
			.post("/api/blog/posts")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({
				"title": "Gallery",
				"excerpt": "...",
				"content": "...",
				"authorId": admin,
			}))
			.await;

		response.json::<Value>()["id"].as_str().unwrap().to_owned()
	}

	#[tokio::test]
	async fn test_media_lifecycle() {
		let (server, admin) = server_with_admin().await;
		let post = post(&server, admin).await;

		let response = server
			.post("/api/blog/media")
			.add_header(PASSWORD.0, PASSWORD.1)
			.json(&json!({
				"blogPostId": post,
				"type": "video",
				"url": "https://cdn.example.com/demo.mp4",
				"mimeType": "video/mp4",
				"width": 1920,
				"height": 1080,
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);

		let media = response.json::<Value>();
		assert_eq!(media["type"], "video");
		assert_eq!(media["blogPostId"], post.as_str());
		assert_eq!(media["altText"], Value::Null);

		let id = media["id"].as_str().unwrap();

		let response = server
			.delete(&format!("/api/blog/media/{id}"))
			.add_header(PASSWORD.0, PASSWORD.1)
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(
			response.json::<Value>(),
			json!({ "message": "Media deleted successfully" })
		);

		let response = server
			.delete(&format!("/api/blog/media/{id}"))
			.add_header(PASSWORD.0, PASSWORD.1)
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(response.json::<Value>()["error"], "Media not found");
	}

	#[tokio::test]
	async fn test_media_needs_an_existing_post() {
		let server = server();

		let response = server
			.post("/api/blog/media")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({
				"blogPostId": Uuid::new_v4(),
				"type": "image",
				"url": "https://cdn.example.com/a.png",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(response.json::<Value>()["error"], "unknown post");
	}

	#[tokio::test]
	async fn test_invalid_media_is_rejected() {
		let (server, admin) = server_with_admin().await;
		let post = post(&server, admin).await;

		let response = server
			.post("/api/blog/media")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({ "blogPostId": post, "type": "audio", "url": "https://cdn.example.com/a.mp3" }))
			.await;
		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

		let response = server
			.post("/api/blog/media")
			.add_header(BEARER.0, BEARER.1)
			.json(&json!({ "blogPostId": post, "type": "image", "url": "" }))
			.await;
		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(response.json::<Value>()["details"][0]["field"], "url");

		let media = server
			.get(&format!("/api/blog/posts/{post}/media"))
			.await
			.json::<Vec<Value>>();
		assert!(media.is_empty());
	}

	#[tokio::test]
	async fn test_mutations_require_admin() {
		let (server, admin) = server_with_admin().await;
		let post = post(&server, admin).await;

		let response = server
			.post("/api/blog/media")
			.json(&json!({ "blogPostId": post, "type": "image", "url": "https://cdn.example.com/a.png" }))
			.await;
		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let response = server
			.delete(&format!("/api/blog/media/{}", Uuid::new_v4()))
			.await;
		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let media = server
			.get(&format!("/api/blog/posts/{post}/media"))
			.await
			.json::<Vec<Value>>();
		assert!(media.is_empty());
	}
}
