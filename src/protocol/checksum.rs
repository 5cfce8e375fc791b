use md5::{Digest, Md5};
use tracing::debug;

use super::fields::{names, FieldSet};
use crate::config::Secret;

/// Computes and verifies the integrity digest shared with the gateway.
///
/// The digest is MD5 over the concatenation of every non-empty field value,
/// in field order, followed by the encryption key. Both sides compute it the
/// same way; a request or response whose digest does not match is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumCodec {
    debug: bool,
}

impl ChecksumCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, logs the concatenated field values (never the key) and
    /// the resulting digest at debug level.
    pub fn with_debug(debug: bool) -> Self {
        Self { debug }
    }

    /// Concatenate non-empty values in field order, append the key, hash.
    /// A value of `"0"` is not empty and participates.
    pub fn compute(&self, fields: &FieldSet, secret: &Secret) -> String {
        let mut source = String::new();
        for (_, value) in fields.iter() {
            if !value.is_empty() {
                source.push_str(value);
            }
        }

        if self.debug {
            debug!(source = %source, "checksum source (key omitted)");
        }

        source.push_str(secret.expose());

        let checksum = hex::encode(Md5::digest(source.as_bytes()));

        if self.debug {
            debug!(%checksum, "checksum computed");
        }

        checksum
    }

    /// Extract the `CHECKSUM` field, recompute over the remaining fields and
    /// compare exactly. A missing checksum field is a verification failure,
    /// not an error.
    pub fn verify(&self, fields: &FieldSet, secret: &Secret) -> bool {
        let mut unsigned = fields.clone();
        let Some(claimed) = unsigned.remove(names::CHECKSUM) else {
            return false;
        };

        let computed = self.compute(&unsigned, secret);
        let matches = claimed == computed;

        if self.debug && !matches {
            debug!(%claimed, %computed, "checksum mismatch");
        }

        matches
    }
}
