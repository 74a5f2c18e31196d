pub mod entropy;
pub mod keywords;
pub mod link;
pub mod review;

mod error;

pub use error::{Error, Result};
