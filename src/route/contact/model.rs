use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::mail::{escape_html, Email};

/// A message sent through the contact form.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
	/// The name of the visitor.
	#[validate(length(min = 2, max = 100))]
	pub name: String,
	/// Where to reply to the visitor.
	#[validate(email)]
	pub email: String,
	/// The kind of help the visitor is looking for.
	#[validate(length(min = 1, max = 200))]
	pub business_needs: String,
	/// Anything else the visitor wants to say.
	#[serde(default)]
	#[validate(length(max = 5000))]
	pub message: Option<String>,
}

impl ContactInput {
	/// Formats the submission as an email to the site owner.
	///
	/// Everything the visitor typed is escaped.
	pub fn to_email(&self) -> Email {
		let message = self
			.message
			.as_deref()
			.filter(|message| !message.trim().is_empty())
			.map_or_else(
				|| "<em>No message</em>".to_owned(),
				|message| escape_html(message).replace('\n', "<br>"),
			);

		let html = format!(
			"<h2>New contact form submission</h2>\
			<p><strong>Name:</strong> {name}</p>\
			<p><strong>Email:</strong> {email}</p>\
			<p><strong>Business needs:</strong> {needs}</p>\
			<p><strong>Message:</strong></p>\
			<p>{message}</p>",
			name = escape_html(&self.name),
			email = escape_html(&self.email),
			needs = escape_html(&self.business_needs),
		);

		Email {
			subject: format!("New contact form submission from {}", self.name),
			html,
			reply_to: Some(self.email.clone()),
		}
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ContactResponse {
	pub success: bool,
	pub message: String,
}

#[cfg(test)]
mod test {
	use super::*;

	fn input(message: Option<&str>) -> ContactInput {
		ContactInput {
			name: "Ada <Lovelace>".into(),
			email: "ada@example.com".into(),
			business_needs: "AI & automation".into(),
			message: message.map(Into::into),
		}
	}

	#[test]
	fn test_email_escapes_input() {
		let email = input(Some("<b>hi</b>\nthere")).to_email();

		assert_eq!(email.subject, "New contact form submission from Ada <Lovelace>");
		assert_eq!(email.reply_to.as_deref(), Some("ada@example.com"));
		assert!(email.html.contains("Ada &lt;Lovelace&gt;"));
		assert!(email.html.contains("AI &amp; automation"));
		assert!(email.html.contains("&lt;b&gt;hi&lt;/b&gt;<br>there"));
		assert!(!email.html.contains("<b>"));
	}

	#[test]
	fn test_email_without_message() {
		assert!(input(None).to_email().html.contains("<em>No message</em>"));
		assert!(input(Some("  ")).to_email().html.contains("<em>No message</em>"));
	}

	#[test]
	fn test_validation() {
		assert!(input(None).validate().is_ok());

		let mut short = input(None);
		short.name = "A".into();
		assert!(short.validate().is_err());

		let mut invalid = input(None);
		invalid.email = "not-an-email".into();
		assert!(invalid.validate().is_err());

		let mut empty = input(None);
		empty.business_needs = String::new();
		assert!(empty.validate().is_err());

		assert!(input(Some(&"a".repeat(5001))).validate().is_err());
	}
}
