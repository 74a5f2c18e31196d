pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<mindcap_storage::Error> for Error {
	fn from(err: mindcap_storage::Error) -> Self {
		match err {
			mindcap_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			mindcap_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			mindcap_storage::Error::NotFound(message) => Self::NotFound { message },
			mindcap_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<mindcap_domain::Error> for Error {
	fn from(err: mindcap_domain::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
