//! Single-line text form of a saved session, for moving it between machines.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use geocoin_core::{PlayerSnapshot, RegistrySnapshot};
use serde::{Deserialize, Serialize};

const TRANSFER_DOMAIN: &str = "geocoin";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded payload.
pub(crate) const TRANSFER_HEADER: &str = "geocoin:v1";
/// Delimiter used to separate the prefix from the payload.
const FIELD_DELIMITER: char = ':';

/// Everything needed to rebuild a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SaveTransfer {
    /// Caches, budgets, serials and ledgers.
    pub registry: RegistrySnapshot,
    /// Inventory, location and trail.
    pub player: PlayerSnapshot,
}

impl SaveTransfer {
    /// Encodes the session into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, SaveTransferError> {
        let json = serde_json::to_vec(self).map_err(SaveTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{TRANSFER_HEADER}:{encoded}"))
    }

    /// Decodes a session from its single-line string form.
    pub(crate) fn decode(value: &str) -> Result<Self, SaveTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SaveTransferError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
        let domain = parts.next().ok_or(SaveTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(SaveTransferError::MissingVersion)?;
        let payload = parts.next().ok_or(SaveTransferError::MissingPayload)?;

        if domain != TRANSFER_DOMAIN {
            return Err(SaveTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRANSFER_VERSION {
            return Err(SaveTransferError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SaveTransferError::InvalidEncoding)?;
        serde_json::from_slice(&bytes).map_err(SaveTransferError::InvalidPayload)
    }
}

/// Errors that can occur while encoding or decoding save strings.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SaveTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("save string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("save string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("save string is missing the version")]
    MissingVersion,
    /// The payload segment was missing.
    #[error("save string is missing the payload")]
    MissingPayload,
    /// The string used an unexpected prefix segment.
    #[error("save prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The string used an unsupported version identifier.
    #[error("save version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode save payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    #[error("could not parse save payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocoin_core::{Cell, Position, Token};

    fn sample() -> SaveTransfer {
        let hash = Cell::new(3, -4).cell_hash();
        SaveTransfer {
            registry: RegistrySnapshot {
                caches: vec![(hash, Cell::new(3, -4))],
                mint_budgets: vec![(hash, 6)],
                mint_serials: vec![(hash, 2)],
                deposit_ledgers: vec![(hash, vec![Token::new(Cell::new(3, -4), 1)])],
            },
            player: PlayerSnapshot {
                inventory: vec![Token::new(Cell::new(3, -4), 0)],
                ..PlayerSnapshot::at(Position::new(0.5, -0.5))
            },
        }
    }

    #[test]
    fn encoded_session_decodes_unchanged() {
        let transfer = sample();
        let encoded = transfer.encode().expect("encodes");
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:")));
        assert!(!encoded.contains('\n'));

        let decoded = SaveTransfer::decode(&format!("  {encoded}\n")).expect("decodes");
        assert_eq!(decoded, transfer);
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        let encoded = sample().encode().expect("encodes");
        let foreign = encoded.replacen("geocoin", "atlas", 1);
        assert!(matches!(
            SaveTransfer::decode(&foreign),
            Err(SaveTransferError::InvalidPrefix(prefix)) if prefix == "atlas"
        ));
    }

    #[test]
    fn newer_version_is_rejected() {
        assert!(matches!(
            SaveTransfer::decode("geocoin:v2:e30"),
            Err(SaveTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
    }

    #[test]
    fn truncated_strings_report_missing_parts() {
        assert!(matches!(
            SaveTransfer::decode("   "),
            Err(SaveTransferError::EmptyPayload)
        ));
        assert!(matches!(
            SaveTransfer::decode("geocoin"),
            Err(SaveTransferError::MissingVersion)
        ));
        assert!(matches!(
            SaveTransfer::decode("geocoin:v1"),
            Err(SaveTransferError::MissingPayload)
        ));
        assert!(matches!(
            SaveTransfer::decode("geocoin:v1:!!!"),
            Err(SaveTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn decoding_failures_keep_their_cause() {
        let error = SaveTransfer::decode("geocoin:v1:!!!").expect_err("bad base64");
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().starts_with("could not decode save payload: "));

        let error = SaveTransfer::decode("geocoin:v1:bm90IGpzb24").expect_err("not json");
        assert!(matches!(error, SaveTransferError::InvalidPayload(_)));
        assert!(std::error::Error::source(&error).is_some());
    }
}
