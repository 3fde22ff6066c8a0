//! Native `.mkit` container.
//!
//! A file is a fixed 32-byte [`FormatHeader`] followed by the stored payload:
//! the postcard encoding of a [`Payload`](crate::io::Payload), zstd-compressed
//! when large and the `storage-compression` feature is on. The header's CRC32
//! covers the stored bytes, so corruption is caught before decoding.
//!
//! ```
//! use modelkit::io::{FormatHeader, ModelKind, NativeCodec};
//!
//! let codec = NativeCodec::new();
//! let mut header = FormatHeader::new(ModelKind::Regressor, 4, 1);
//! let mut bytes = Vec::new();
//! codec.write_to(&mut bytes, &mut header, b"payload").unwrap();
//!
//! let (header, payload) = codec.read_from(&mut bytes.as_slice()).unwrap();
//! assert_eq!(header.model_kind, ModelKind::Regressor);
//! assert_eq!(payload, b"payload");
//! ```

use std::io::{Read, Write};

use thiserror::Error;

/// First four bytes of every native model file.
pub const MAGIC: &[u8; 4] = b"MKIT";

/// Files with a newer major version are refused.
pub const CURRENT_VERSION_MAJOR: u8 = 1;

/// Newer minor versions stay readable.
pub const CURRENT_VERSION_MINOR: u8 = 0;

pub const HEADER_SIZE: usize = 32;

/// Payloads at least this large are compressed (32 KiB).
#[cfg(feature = "storage-compression")]
pub const COMPRESSION_THRESHOLD: usize = 32 * 1024;

/// zstd level for compressed payloads.
#[cfg(feature = "storage-compression")]
pub const COMPRESSION_LEVEL: i32 = 3;

/// Byte offsets of the header fields. Gaps are reserved and written as zero.
mod offset {
    pub const MAGIC: usize = 0;
    pub const VERSION_MAJOR: usize = 4;
    pub const VERSION_MINOR: usize = 5;
    pub const MODEL_KIND: usize = 6;
    pub const FLAGS: usize = 8;
    pub const PAYLOAD_SIZE: usize = 12;
    pub const CHECKSUM: usize = 16;
    pub const NUM_FEATURES: usize = 20;
    pub const NUM_GROUPS: usize = 24;
}

// ============================================================================
// Model Kind
// ============================================================================

/// What the stored model predicts. Must agree with the payload's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModelKind {
    Regressor = 0,
    BinaryClassifier = 1,
    MulticlassClassifier = 2,
}

impl TryFrom<u8> for ModelKind {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, u8> {
        Ok(match tag {
            0 => Self::Regressor,
            1 => Self::BinaryClassifier,
            2 => Self::MulticlassClassifier,
            other => return Err(other),
        })
    }
}

// ============================================================================
// Format Flags
// ============================================================================

/// Header flag bits.
///
/// [`COMPRESSED`](Self::COMPRESSED) describes how the payload is stored; the
/// [`CONTENT`](Self::CONTENT) bits describe what it holds and are checked
/// against the decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags(u16);

impl FormatFlags {
    pub const COMPRESSED: u16 = 0b001;
    /// The inner model is a tree ensemble rather than linear.
    pub const TREE_MODEL: u16 = 0b010;
    /// Some feature group reads text (bag of words).
    pub const HAS_TEXT: u16 = 0b100;
    pub const CONTENT: u16 = Self::TREE_MODEL | Self::HAS_TEXT;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether any bit of `flag` is set.
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    /// Only the bits of `mask`.
    pub const fn masked(self, mask: u16) -> Self {
        Self(self.0 & mask)
    }

    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u16) {
        self.0 &= !flag;
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// The fixed-size prefix of a native file.
///
/// ```text
/// bytes   field
/// 0..4    magic "MKIT"
/// 4       version major
/// 5       version minor
/// 6       model kind
/// 8..10   flags
/// 12..16  stored payload size
/// 16..20  CRC32 of the stored payload
/// 20..24  feature count
/// 24..28  output group count
/// ```
///
/// Integers are little-endian; bytes 7, 10..12 and 28..32 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub model_kind: ModelKind,
    pub flags: FormatFlags,
    /// Size of the payload as stored, after any compression.
    pub payload_size: u32,
    pub checksum: u32,
    pub num_features: u32,
    pub num_groups: u32,
}

impl FormatHeader {
    /// A current-version header with no flags; size and checksum are filled
    /// in by [`NativeCodec::write_to`].
    pub fn new(model_kind: ModelKind, num_features: u32, num_groups: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            model_kind,
            flags: FormatFlags::empty(),
            payload_size: 0,
            checksum: 0,
            num_features,
            num_groups,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let mut put = |at: usize, bytes: &[u8]| buf[at..at + bytes.len()].copy_from_slice(bytes);

        put(offset::MAGIC, MAGIC);
        put(offset::VERSION_MAJOR, &[self.version_major]);
        put(offset::VERSION_MINOR, &[self.version_minor]);
        put(offset::MODEL_KIND, &[self.model_kind as u8]);
        put(offset::FLAGS, &self.flags.bits().to_le_bytes());
        put(offset::PAYLOAD_SIZE, &self.payload_size.to_le_bytes());
        put(offset::CHECKSUM, &self.checksum.to_le_bytes());
        put(offset::NUM_FEATURES, &self.num_features.to_le_bytes());
        put(offset::NUM_GROUPS, &self.num_groups.to_le_bytes());
        buf
    }

    /// Parse a header, refusing foreign files and newer major versions.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DeserializeError> {
        if !buf.starts_with(MAGIC) {
            return Err(DeserializeError::NotAModel);
        }

        let (major, minor) = (buf[offset::VERSION_MAJOR], buf[offset::VERSION_MINOR]);
        if major > CURRENT_VERSION_MAJOR {
            return Err(DeserializeError::UnsupportedVersion { major, minor });
        }

        let model_kind = ModelKind::try_from(buf[offset::MODEL_KIND]).map_err(|tag| {
            DeserializeError::CorruptPayload(format!("unknown model kind tag {tag}"))
        })?;

        let u16_at = |at: usize| u16::from_le_bytes([buf[at], buf[at + 1]]);
        let u32_at = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        Ok(Self {
            version_major: major,
            version_minor: minor,
            model_kind,
            flags: FormatFlags::from_bits(u16_at(offset::FLAGS)),
            payload_size: u32_at(offset::PAYLOAD_SIZE),
            checksum: u32_at(offset::CHECKSUM),
            num_features: u32_at(offset::NUM_FEATURES),
            num_groups: u32_at(offset::NUM_GROUPS),
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Writing a model file failed.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored payload does not fit the header's 32-bit size field.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[cfg(feature = "storage-compression")]
    #[error("compression error: {0}")]
    Compression(std::io::Error),
}

/// Reading a model file failed before validation.
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// Neither the native magic nor JSON.
    #[error("not a model file")]
    NotAModel,

    #[error("model format {major}.{minor} is newer than this library supports")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "storage-compression")]
    #[error("decompression error: {0}")]
    Decompression(std::io::Error),

    /// Header model kind disagrees with the payload task.
    #[error("model kind mismatch: header says {header:?}, payload says {payload:?}")]
    KindMismatch { header: ModelKind, payload: ModelKind },

    /// Header content flags disagree with the payload.
    #[error("header flags {header:#06x} do not describe the payload ({payload:#06x})")]
    FlagsMismatch { header: u16, payload: u16 },
}

/// CRC32 of the stored payload bytes.
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// ============================================================================
// Native Codec
// ============================================================================

/// Reads and writes the native container.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl NativeCodec {
    pub const fn new() -> Self {
        Self
    }

    /// Write `header` and `payload`, filling in the header's size, checksum
    /// and compression flag.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        header: &mut FormatHeader,
        payload: &[u8],
    ) -> Result<(), SerializeError> {
        let compressed = compress(payload)?;
        let stored = compressed.as_deref().unwrap_or(payload);

        header.payload_size = u32::try_from(stored.len())
            .map_err(|_| SerializeError::PayloadTooLarge(stored.len()))?;
        header.checksum = compute_checksum(stored);
        if compressed.is_some() {
            header.flags.set(FormatFlags::COMPRESSED);
        } else {
            header.flags.clear(FormatFlags::COMPRESSED);
        }

        writer.write_all(&header.to_bytes())?;
        writer.write_all(stored)?;
        Ok(())
    }

    /// Read a header and its checksum-verified, decompressed payload.
    pub fn read_from<R: Read>(&self, reader: &mut R) -> Result<(FormatHeader, Vec<u8>), DeserializeError> {
        let mut header_buf = [0u8; HEADER_SIZE];
        let got = read_up_to(reader, &mut header_buf)?;
        if got < HEADER_SIZE {
            // Without the magic there is no reason to call it a model.
            if !header_buf[..got].starts_with(MAGIC) {
                return Err(DeserializeError::NotAModel);
            }
            return Err(DeserializeError::Truncated {
                expected: HEADER_SIZE,
                actual: got,
            });
        }
        let header = FormatHeader::from_bytes(&header_buf)?;

        let stored_len = header.payload_size as usize;
        let mut stored = Vec::with_capacity(stored_len.min(1 << 20));
        reader.take(stored_len as u64).read_to_end(&mut stored)?;
        if stored.len() < stored_len {
            return Err(DeserializeError::Truncated {
                expected: HEADER_SIZE + stored_len,
                actual: HEADER_SIZE + stored.len(),
            });
        }

        let actual = compute_checksum(&stored);
        if actual != header.checksum {
            return Err(DeserializeError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        let payload = if header.flags.contains(FormatFlags::COMPRESSED) {
            decompress(&stored)?
        } else {
            stored
        };
        Ok((header, payload))
    }

    /// Encode `payload` with postcard behind `header`.
    pub fn serialize<T: serde::Serialize>(
        &self,
        mut header: FormatHeader,
        payload: &T,
    ) -> Result<Vec<u8>, SerializeError> {
        let encoded = postcard::to_allocvec(payload)?;
        let mut output = Vec::with_capacity(HEADER_SIZE + encoded.len());
        self.write_to(&mut output, &mut header, &encoded)?;
        Ok(output)
    }

    /// Decode a container written by [`NativeCodec::serialize`].
    pub fn deserialize<T: for<'de> serde::Deserialize<'de>>(
        &self,
        mut bytes: &[u8],
    ) -> Result<(FormatHeader, T), DeserializeError> {
        let (header, encoded) = self.read_from(&mut bytes)?;
        Ok((header, postcard::from_bytes(&encoded)?))
    }
}

/// The compressed payload, or `None` when it is stored as is.
#[cfg(feature = "storage-compression")]
fn compress(payload: &[u8]) -> Result<Option<Vec<u8>>, SerializeError> {
    if payload.len() < COMPRESSION_THRESHOLD {
        return Ok(None);
    }
    zstd::encode_all(payload, COMPRESSION_LEVEL)
        .map(Some)
        .map_err(SerializeError::Compression)
}

#[cfg(not(feature = "storage-compression"))]
fn compress(_payload: &[u8]) -> Result<Option<Vec<u8>>, SerializeError> {
    Ok(None)
}

#[cfg(feature = "storage-compression")]
fn decompress(stored: &[u8]) -> Result<Vec<u8>, DeserializeError> {
    zstd::decode_all(stored).map_err(DeserializeError::Decompression)
}

#[cfg(not(feature = "storage-compression"))]
fn decompress(_stored: &[u8]) -> Result<Vec<u8>, DeserializeError> {
    Err(DeserializeError::CorruptPayload(
        "payload is compressed but the storage-compression feature is disabled".into(),
    ))
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, DeserializeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(DeserializeError::Io(e)),
        }
    }
    Ok(filled)
}
