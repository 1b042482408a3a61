//! # Record Format
//!
//! Binary encoding for stored incident and user records.
//!
//! Format: Header (5 bytes) + postcard-serialized record.
//! - 4 bytes: Magic ("CYSH")
//! - 1 byte: Version
//!
//! The header is checked before the payload is parsed, so a record written by
//! an incompatible build is rejected instead of being misread.

use crate::{CyberShieldError, primitives};
use serde::{Serialize, de::DeserializeOwned};

/// Maximum allowed payload size for a single record (1 MB).
pub const MAX_RECORD_PAYLOAD_SIZE: usize = 1024 * 1024;

const HEADER_SIZE: usize = 5;

/// The header that precedes every stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl RecordHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate magic bytes and version.
    pub fn validate(&self) -> Result<(), CyberShieldError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(CyberShieldError::Serialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(CyberShieldError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CyberShieldError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CyberShieldError::Serialization(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for RecordHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a record as header + postcard payload.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, CyberShieldError> {
    let payload = postcard::to_stdvec(record)
        .map_err(|e| CyberShieldError::Serialization(e.to_string()))?;
    if payload.len() > MAX_RECORD_PAYLOAD_SIZE {
        return Err(CyberShieldError::Serialization(format!(
            "Record size {} exceeds maximum {} bytes",
            payload.len(),
            MAX_RECORD_PAYLOAD_SIZE
        )));
    }

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&RecordHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a record previously written by `encode_record`.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CyberShieldError> {
    RecordHeader::from_bytes(bytes)?.validate()?;

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() > MAX_RECORD_PAYLOAD_SIZE {
        return Err(CyberShieldError::Serialization(format!(
            "Record size {} exceeds maximum {} bytes",
            payload.len(),
            MAX_RECORD_PAYLOAD_SIZE
        )));
    }
    postcard::from_bytes(payload).map_err(|e| CyberShieldError::Serialization(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
