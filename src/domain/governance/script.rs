//! Aragon EVM script framing
//!
//! Layout: 4-byte spec id `0x00000001`, then back-to-back entries of
//! `target (20 bytes) | length (4 bytes, big-endian) | calldata (length bytes)`.

use std::fmt;

use alloy_primitives::{Address, Bytes};

use crate::domain::error::{GovernanceError, GovernanceResult};

/// Spec id 1 header
pub const SPEC_ID: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

const ADDRESS_LEN: usize = 20;
const LENGTH_LEN: usize = 4;
const ENTRY_HEADER_LEN: usize = ADDRESS_LEN + LENGTH_LEN;

/// One framed call of a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub target: Address,
    pub calldata: Bytes,
}

impl ScriptEntry {
    pub fn new(target: Address, calldata: impl Into<Bytes>) -> Self {
        Self {
            target,
            calldata: calldata.into(),
        }
    }

    /// 4-byte selector of the calldata, if it has one
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.calldata
            .get(..4)
            .and_then(|s| <[u8; 4]>::try_from(s).ok())
    }
}

/// A complete EVM script as stored on a vote
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvmScript(Bytes);

impl EvmScript {
    /// Wrap raw script bytes without validating them
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Parse a hex string, with or without `0x`
    pub fn from_hex(input: &str) -> GovernanceResult<Self> {
        let trimmed = input.trim();
        let payload = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(payload)
            .map_err(|e| GovernanceError::malformed(format!("invalid hex: {}", e)))?;
        Ok(Self(bytes.into()))
    }

    /// Frame entries behind the spec id header
    pub fn from_entries(entries: &[ScriptEntry]) -> GovernanceResult<Self> {
        let size = SPEC_ID.len()
            + entries
                .iter()
                .map(|e| ENTRY_HEADER_LEN + e.calldata.len())
                .sum::<usize>();
        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&SPEC_ID);
        for entry in entries {
            let length = u32::try_from(entry.calldata.len()).map_err(|_| {
                GovernanceError::malformed(format!(
                    "calldata for {} exceeds 4-byte length field",
                    entry.target
                ))
            })?;
            out.extend_from_slice(entry.target.as_slice());
            out.extend_from_slice(&length.to_be_bytes());
            out.extend_from_slice(&entry.calldata);
        }
        Ok(Self(out.into()))
    }

    /// Walk the framing; fails on a bad header, an overlong entry or trailing bytes
    pub fn parse(&self) -> GovernanceResult<Vec<ScriptEntry>> {
        let data: &[u8] = &self.0;
        match data.get(..SPEC_ID.len()) {
            Some(header) if header == SPEC_ID => {}
            Some(header) => {
                return Err(GovernanceError::malformed(format!(
                    "unsupported spec id 0x{}",
                    hex::encode(header)
                )))
            }
            None => {
                return Err(GovernanceError::malformed(format!(
                    "script is {} bytes, shorter than the spec id header",
                    data.len()
                )))
            }
        }

        let mut entries = Vec::new();
        let mut cursor = SPEC_ID.len();
        while cursor < data.len() {
            let remaining = data.len() - cursor;
            if remaining < ENTRY_HEADER_LEN {
                return Err(GovernanceError::malformed(format!(
                    "{} trailing bytes at offset {} after entry #{}",
                    remaining,
                    cursor,
                    entries.len()
                )));
            }

            let target = Address::from_slice(&data[cursor..cursor + ADDRESS_LEN]);
            cursor += ADDRESS_LEN;

            let mut length = [0u8; LENGTH_LEN];
            length.copy_from_slice(&data[cursor..cursor + LENGTH_LEN]);
            let length = u32::from_be_bytes(length) as usize;
            cursor += LENGTH_LEN;

            if length > data.len() - cursor {
                return Err(GovernanceError::malformed(format!(
                    "entry #{} declares {} bytes of calldata but only {} remain",
                    entries.len(),
                    length,
                    data.len() - cursor
                )));
            }

            let calldata = Bytes::copy_from_slice(&data[cursor..cursor + length]);
            cursor += length;

            entries.push(ScriptEntry { target, calldata });
        }

        Ok(entries)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EvmScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<Bytes> for EvmScript {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}
