pub mod config;
pub mod encode;
mod error;
pub mod input;
pub mod prediction;

pub use config::{EncodingConfig, OrdinalPolicy, Side};
pub use encode::{EncodedBatch, encode_batch, encode_domain};
pub use error::{ConfigError, EncodeError, InputError};
pub use input::{parse_domains, read_domains};
pub use prediction::Prediction;
