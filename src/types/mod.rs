use thiserror::Error;

mod domain_types;
mod ids;
mod rich_text;

pub use domain_types::*;
pub use ids::*;
pub use rich_text::*;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}
