//! PEM decoding.

use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Extracts the DER payload of the first PEM block with the given label.
///
/// Returns `None` when no such block exists or its body is not valid base64.
#[must_use]
pub fn pem_to_der(pem: &str, label: &str) -> Option<Vec<u8>> {
    pem_blocks(pem, label).ok()?.into_iter().next()
}

/// Extracts the DER payloads of every PEM block with the given label, in order.
///
/// Certificate chains are stored as consecutive `CERTIFICATE` blocks.
///
/// # Errors
///
/// Returns [`CryptoError::MissingPemBlock`] when no block carries the label,
/// or [`CryptoError::InvalidKey`] when a block body is not valid base64.
pub fn pem_blocks(pem: &str, label: &str) -> CryptoResult<Vec<Vec<u8>>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let mut blocks = Vec::new();
    let mut rest = pem;
    while let Some(start) = rest.find(&begin) {
        let body_start = start + begin.len();
        let Some(body_len) = rest[body_start..].find(&end) else {
            break;
        };

        let b64: String = rest[body_start..body_start + body_len]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let der = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid base64 in {label} block: {e}")))?;
        blocks.push(der);

        rest = &rest[body_start + body_len + end.len()..];
    }

    if blocks.is_empty() {
        return Err(CryptoError::MissingPemBlock(label.to_string()));
    }
    Ok(blocks)
}
