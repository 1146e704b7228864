//! Character-ordinal encoding of domain names into fixed-width rows.
//!
//! Each character becomes its Unicode scalar value. Rows are then padded with
//! the sentinel or truncated so every row is exactly `max_len` wide:
//!
//! - `google.com` with post padding → `[103, 111, 111, 103, 108, 101, 46, 99, 111, 109, -1, ...]`
//! - a 120-char name with pre truncation → its last 100 characters

use crate::config::{EncodingConfig, OrdinalPolicy, Side};
use crate::error::EncodeError;

/// A row-major `rows × width` block of encoded domains, ready to hand to the
/// inference runtime as a single tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    data: Vec<i64>,
    rows: usize,
    width: usize,
}

impl EncodedBatch {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Tensor shape `[rows, width]`.
    pub fn shape(&self) -> [i64; 2] {
        [self.rows as i64, self.width as i64]
    }

    pub fn row(&self, i: usize) -> &[i64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.data
    }
}

/// Encode a single domain into a row of exactly `config.max_len` values.
pub fn encode_domain(domain: &str, config: &EncodingConfig) -> Result<Vec<i64>, EncodeError> {
    let mut row = Vec::with_capacity(config.max_len);
    encode_into(domain, config, &mut row)?;
    Ok(row)
}

/// Encode every domain into one batch, preserving input order.
pub fn encode_batch<S: AsRef<str>>(
    domains: &[S],
    config: &EncodingConfig,
) -> Result<EncodedBatch, EncodeError> {
    let mut data = Vec::with_capacity(domains.len() * config.max_len);
    for domain in domains {
        encode_into(domain.as_ref(), config, &mut data)?;
    }
    Ok(EncodedBatch {
        data,
        rows: domains.len(),
        width: config.max_len,
    })
}

/// Append the encoded row for `domain` to `out`.
fn encode_into(domain: &str, config: &EncodingConfig, out: &mut Vec<i64>) -> Result<(), EncodeError> {
    let ordinals = domain
        .chars()
        .enumerate()
        .map(|(index, ch)| ordinal(domain, index, ch, config))
        .collect::<Result<Vec<i64>, _>>()?;

    let kept = if ordinals.len() > config.max_len {
        match config.truncating {
            Side::Pre => &ordinals[ordinals.len() - config.max_len..],
            Side::Post => &ordinals[..config.max_len],
        }
    } else {
        &ordinals[..]
    };

    let pad = config.max_len - kept.len();
    match config.padding {
        Side::Pre => {
            out.extend(std::iter::repeat_n(config.pad_value, pad));
            out.extend_from_slice(kept);
        }
        Side::Post => {
            out.extend_from_slice(kept);
            out.extend(std::iter::repeat_n(config.pad_value, pad));
        }
    }
    Ok(())
}

fn ordinal(domain: &str, index: usize, ch: char, config: &EncodingConfig) -> Result<i64, EncodeError> {
    let code = ch as u32;
    if code <= config.max_ordinal {
        return Ok(code as i64);
    }
    match config.ordinals {
        OrdinalPolicy::PassThrough => Ok(code as i64),
        OrdinalPolicy::Clamp => Ok(config.max_ordinal as i64),
        OrdinalPolicy::Reject => Err(EncodeError::Unrepresentable {
            domain: domain.to_string(),
            index,
            ch,
        }),
    }
}
