use aide::axum::ApiRouter;

use crate::AppState;

pub mod category;
pub mod contact;
pub mod docs;
pub mod media;
pub mod model;
pub mod post;

pub use model::{Deleted, IdInput, PostIdInput, PostSlugInput};

/// Every API route, without the documentation.
pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.nest("/api/blog/categories", category::routes())
		.nest("/api/blog/posts", post::routes())
		.nest("/api/blog/media", media::routes())
		.nest("/api/contact", contact::routes())
}
