use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{
	error::{ErrorBody, Message},
	extract::{Json, PASSWORD_HEADER},
};

pub const SECURITY_SCHEME_BEARER: &str = "Admin Token";
pub const SECURITY_SCHEME_PASSWORD: &str = "Admin Password";

pub mod tag {
	pub const CATEGORY: &str = "Category";
	pub const POST: &str = "Post";
	pub const MEDIA: &str = "Media";
	pub const CONTACT: &str = "Contact";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("NeuralCoder API")
		.summary("Blog and contact form backend for the NeuralCoder site")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::CATEGORY.into(),
			description: Some("Blog categories".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Blog posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::MEDIA.into(),
			description: Some("Images, videos and documents attached to posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::CONTACT.into(),
			description: Some("The contact form".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: None,
				description: Some("The `ADMIN_TOKEN` of the server".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_PASSWORD,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Header,
				name: PASSWORD_HEADER.into(),
				description: Some("The `ADMIN_PASSWORD` of the server".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<ErrorBody>, _>(|res| {
			res.example(ErrorBody {
				error: "validation failed".into(),
				details: Message::new("length")
					.field("name")
					.detail("min", 2)
					.into_vec(),
			})
		})
}
