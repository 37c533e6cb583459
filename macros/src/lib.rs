mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary, the rest becomes the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates two new structs: `CreateX` and `UpdateX` for the model.
///
/// For both models, fields with #[serde(skip_deserializing)] are skipped, and all
/// other fields are included with their attributes (`sqlx` attributes and the
/// `FromRow` derive are dropped, since the inputs never come from a row).
///
/// Field options:
/// - `#[model(optional)]`: the field is `Option<T>` in `CreateX`.
///
/// Struct options:
/// - `#[model(skip_update)]`: do not generate `UpdateX`.
///
/// In `UpdateX`, every field is optional. Fields that are already `Option<T>`
/// keep their type, so an absent or `null` value leaves the stored one untouched.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
