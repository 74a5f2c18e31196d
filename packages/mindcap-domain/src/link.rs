use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Kind of evidence behind an echo link, ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
	/// Created within the temporal window of each other.
	Temporal,
	/// Shares enough keywords.
	Semantic,
	/// Explicitly derived by the user.
	Structural,
}
impl LinkType {
	pub const ALL: [Self; 3] = [Self::Temporal, Self::Semantic, Self::Structural];

	pub fn strength(self) -> i32 {
		match self {
			Self::Temporal => 1,
			Self::Semantic => 2,
			Self::Structural => 3,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Temporal => "temporal",
			Self::Semantic => "semantic",
			Self::Structural => "structural",
		}
	}
}
impl fmt::Display for LinkType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for LinkType {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"temporal" => Ok(Self::Temporal),
			"semantic" => Ok(Self::Semantic),
			"structural" => Ok(Self::Structural),
			other => Err(Error::UnknownLinkType(other.to_string())),
		}
	}
}

/// Order-independent identity of a link, used to collapse duplicates on read.
pub fn pair_key<T>(source: T, target: T, link_type: LinkType) -> (T, T, LinkType)
where
	T: Ord,
{
	if source <= target { (source, target, link_type) } else { (target, source, link_type) }
}
