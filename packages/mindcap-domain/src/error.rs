pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Review count must be zero or greater, got {0}.")]
	NegativeReviewCount(i32),
	#[error("Unknown link type {0:?}.")]
	UnknownLinkType(String),
	#[error("Review date is out of the supported range.")]
	DateOutOfRange,
}
