use argon2::Argon2;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	error,
	model::{NewUser, User},
	storage::{self, Storage},
};

pub const KEY_LENGTH: usize = 32;

/// An error that can occur while authorizing a request.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unauthorized: Admin access required")]
	Unauthorized,
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Unauthorized => StatusCode::UNAUTHORIZED,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error("password hashing failed: {0}")]
	Argon(#[from] argon2::Error),
	#[error(transparent)]
	Storage(#[from] storage::Error),
}

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Returns the admin user, creating it with `password` if it does not exist.
///
/// Posts need an existing author, so this gives a fresh deployment one to use.
pub async fn ensure_admin(
	storage: &dyn Storage,
	hasher: &Argon2<'_>,
	username: &str,
	password: &str,
) -> Result<User, BootstrapError> {
	if let Some(user) = storage.get_user_by_username(username).await? {
		tracing::info!(id = %user.id, username, "admin user exists");
		return Ok(user);
	}

	let id = Uuid::new_v4();
	let hash = hash_password(hasher, password, &id)?;

	let user = storage
		.create_user(NewUser {
			id,
			username: username.to_owned(),
			password: hash.to_vec(),
		})
		.await?;

	tracing::info!(id = %user.id, username, "created admin user");

	Ok(user)
}
