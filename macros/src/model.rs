use darling::{ast, FromDeriveInput, FromField, FromMeta};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::{punctuated::Punctuated, Meta, Token};

#[derive(Debug, Default, FromMeta)]
struct ModelArgs {
	#[darling(default)]
	skip_update: bool,
}

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(attributes(model), forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,

	#[darling(default)]
	optional: bool,
}

pub fn from_input(
	args: proc_macro::TokenStream,
	input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match ModelArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let mut input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	// `#[model(..)]` on fields is not a registered attribute, so it must not
	// survive on the original struct.
	if let syn::Data::Struct(ref mut data) = input.data {
		for field in &mut data.fields {
			field.attrs.retain(|attr| !attr.path().is_ident("model"));
		}
	}

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let create_ident = format_ident!("Create{}", ident);
	let update_ident = format_ident!("Update{}", ident);

	let attrs = receiver
		.attrs
		.iter()
		.filter(|attr| !attr.path().is_ident("sqlx"))
		.map(strip_from_row)
		.collect::<Vec<_>>();

	let fields = receiver.data.take_struct().expect("expected struct");
	let fields = fields
		.iter()
		.filter(|field| !has_serde_flag(&field.attrs, &["skip_deserializing", "skip"]))
		.filter_map(|field| {
			let attrs = field
				.attrs
				.iter()
				.filter(|attr| !attr.path().is_ident("sqlx") && !attr.path().is_ident("model"))
				.collect::<Vec<_>>();

			Some((field, field.ident.as_ref()?, attrs))
		})
		.collect::<Vec<_>>();

	let create_fields = fields.iter().map(|(field, ident, attrs)| {
		let ty = &field.ty;
		let vis = &field.vis;

		if field.optional && !is_option(ty) {
			let default = (!has_serde_flag(&field.attrs, &["default"])).then(|| quote!(#[serde(default)]));

			quote! {
				#(#attrs)*
				#default
				#vis #ident: Option<#ty>,
			}
		} else {
			quote! {
				#(#attrs)*
				#vis #ident: #ty,
			}
		}
	});

	let update_fields = fields.iter().map(|(field, ident, attrs)| {
		let ty = &field.ty;
		let vis = &field.vis;
		// Defaults belong to creation only; an update leaves absent fields alone.
		let attrs = attrs
			.iter()
			.filter(|attr| !has_serde_flag(std::slice::from_ref(**attr), &["default"]));
		let ty = if is_option(ty) {
			quote!(#ty)
		} else {
			quote!(Option<#ty>)
		};

		quote! {
			#(#attrs)*
			#[serde(default)]
			#vis #ident: #ty,
		}
	});

	let update = if args.skip_update {
		None
	} else {
		Some(quote! {
			#(#attrs)*
			#vis struct #update_ident #generics {
				#(
					#update_fields
				)*
			}
		})
	};

	quote! {
		#input

		#(#attrs)*
		#vis struct #create_ident #generics {
			#(
				#create_fields
			)*
		}

		#update
	}
	.into()
}

/// Returns true if any `#[serde(..)]` attribute contains one of the given idents.
fn has_serde_flag(attrs: &[syn::Attribute], flags: &[&str]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if flags.iter().any(|flag| ident == flag))
		})
	})
}

fn is_option(ty: &syn::Type) -> bool {
	let syn::Type::Path(path) = ty else {
		return false;
	};

	path.path
		.segments
		.last()
		.is_some_and(|segment| segment.ident == "Option")
}

/// Removes `FromRow` from a `#[derive(..)]` attribute, leaving other attributes untouched.
fn strip_from_row(attr: &syn::Attribute) -> proc_macro2::TokenStream {
	if !attr.path().is_ident("derive") {
		return attr.to_token_stream();
	}

	let Ok(paths) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
	else {
		return attr.to_token_stream();
	};

	let paths = paths
		.into_iter()
		.filter(|path| !path.segments.last().is_some_and(|s| s.ident == "FromRow"));

	quote! {
		#[derive(#(#paths),*)]
	}
}
