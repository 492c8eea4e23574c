use error::WebfeatError;

pub mod error;
pub mod filter;
pub mod ingest;

pub type WebfeatResult<T> = std::result::Result<T, WebfeatError>;
