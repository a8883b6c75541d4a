//! # wsf-crypto
//!
//! Cryptographic primitives for the WS-Federation bridge, built on aws-lc-rs.
//!
//! WS-Federation relying parties (WIF, OWIN, ADFS-era stacks) verify XML
//! signatures made with RSA PKCS#1 v1.5 over SHA-2 digests, so that is the
//! only signature family offered here:
//!
//! - [`hash`] - SHA-256/384/512 digests used for XML-DSig references
//! - [`rsa`] - RSA signing keys and signature verification
//! - [`pem`] - PEM block decoding for keys and certificates
//! - [`x509`] - certificate public key extraction
//!
//! SHA-1 is deliberately absent.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod hash;
pub mod pem;
pub mod rsa;
pub mod x509;

pub use error::{CryptoError, CryptoResult};
pub use hash::{digest, sha256, sha384, sha512, HashAlgorithm};
pub use pem::{pem_blocks, pem_to_der};
pub use rsa::{rsa_verify, RsaAlgorithm, RsaSigningKey};
pub use x509::{certificate_public_key, certificate_subject};
