//! Header layouts.
//!
//! A [`HeaderLayout`] describes the fixed-width prefix of every packet: where
//! the payload length lives (or that the payload length is fixed), an
//! optional sync marker, and an optional checksum field. The width never
//! changes for the lifetime of a session.
//!
//! ```text
//! length_prefixed_sum8():
//! ┌──────────────┬──────────┬──────────────────┐
//! │ Length (2B)  │ Sum8     │ Payload          │
//! │ LE           │ (1B)     │ (Length bytes)   │
//! └──────────────┴──────────┴──────────────────┘
//! ```

use crate::checksum::ChecksumKind;
use crate::error::{ConfigError, FrameError, Result};

/// Byte order of a multi-byte header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Read an unsigned integer from up to 8 bytes.
    pub fn read_uint(self, bytes: &[u8]) -> u64 {
        debug_assert!(bytes.len() <= 8);
        match self {
            ByteOrder::Little => bytes
                .iter()
                .rev()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
            ByteOrder::Big => bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
        }
    }

    /// Write the low `dst.len()` bytes of `value`.
    pub fn write_uint(self, value: u64, dst: &mut [u8]) {
        debug_assert!(dst.len() <= 8);
        let le = value.to_le_bytes();
        let width = dst.len();
        match self {
            ByteOrder::Little => dst.copy_from_slice(&le[..width]),
            ByteOrder::Big => {
                for (slot, byte) in dst.iter_mut().zip(le[..width].iter().rev()) {
                    *slot = *byte;
                }
            }
        }
    }
}

/// A header field declaring the payload length.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LengthField {
    pub offset: usize,
    /// Width in bytes, 1 to 8.
    pub width: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub order: ByteOrder,
    /// The declared value counts the header as well as the payload.
    #[cfg_attr(feature = "serde", serde(default))]
    pub includes_header: bool,
}

impl LengthField {
    /// A payload-only length field.
    pub fn new(offset: usize, width: usize, order: ByteOrder) -> Self {
        Self {
            offset,
            width,
            order,
            includes_header: false,
        }
    }

    /// Largest value the field can carry.
    pub fn max_value(&self) -> u64 {
        if self.width >= 8 {
            u64::MAX
        } else {
            (1u64 << (self.width * 8)) - 1
        }
    }
}

/// How a packet's payload length is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PayloadLength {
    /// Read from a header field.
    Declared(LengthField),
    /// Every payload has the same size.
    Fixed(usize),
}

/// Magic bytes that every valid header carries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SyncMarker {
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// Which bytes the checksum covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Coverage {
    /// Payload bytes only.
    #[default]
    Payload,
    /// Header bytes (minus the checksum field itself) followed by the payload.
    Frame,
}

/// A header field carrying a checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChecksumField {
    pub kind: ChecksumKind,
    pub offset: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub order: ByteOrder,
    #[cfg_attr(feature = "serde", serde(default))]
    pub coverage: Coverage,
}

impl ChecksumField {
    /// A payload checksum stored little-endian.
    pub fn new(kind: ChecksumKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            order: ByteOrder::Little,
            coverage: Coverage::Payload,
        }
    }

    /// Cover the header as well as the payload.
    pub fn over_frame(mut self) -> Self {
        self.coverage = Coverage::Frame;
        self
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.kind.width()
    }
}

/// The fixed-width prefix of every packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct HeaderLayout {
    /// Header width in bytes.
    pub width: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sync: Option<SyncMarker>,
    pub length: PayloadLength,
    #[cfg_attr(feature = "serde", serde(default))]
    pub checksum: Option<ChecksumField>,
}

/// The fields recovered from a self-consistent header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    /// Payload bytes that follow the header.
    pub payload_len: usize,
    /// Checksum carried by the header, if the layout has one.
    pub checksum: Option<u32>,
}

/// Why a header window was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFault {
    /// The sync marker did not match.
    SyncMismatch,
    /// The declared length is beyond the maximum payload size (or, for a
    /// length that includes the header, smaller than the header).
    LengthOutOfRange { declared: u64 },
}

impl HeaderLayout {
    /// A header of `width` bytes with the given payload length rule.
    pub fn new(width: usize, length: PayloadLength) -> Self {
        Self {
            width,
            sync: None,
            length,
            checksum: None,
        }
    }

    /// Two-byte little-endian payload length followed by a Sum8 payload
    /// checksum.
    pub fn length_prefixed_sum8() -> Self {
        Self::new(
            3,
            PayloadLength::Declared(LengthField::new(0, 2, ByteOrder::Little)),
        )
        .with_checksum(ChecksumField::new(ChecksumKind::Sum8, 2))
    }

    /// A constant marker followed by a payload of exactly `payload_len` bytes.
    pub fn fixed(marker: &[u8], payload_len: usize) -> Self {
        Self::new(marker.len(), PayloadLength::Fixed(payload_len)).with_sync(0, marker)
    }

    /// Require `bytes` at `offset` in every header.
    pub fn with_sync(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.sync = Some(SyncMarker {
            offset,
            bytes: bytes.to_vec(),
        });
        self
    }

    /// Carry a checksum in the header.
    pub fn with_checksum(mut self, checksum: ChecksumField) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Check the layout against a maximum payload size.
    pub fn validate(&self, max_payload: usize) -> std::result::Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroHeaderWidth);
        }
        if max_payload == 0 {
            return Err(ConfigError::ZeroMaxPayload);
        }

        let mut fields: Vec<(&'static str, usize, usize)> = Vec::with_capacity(3);

        if let Some(sync) = &self.sync {
            if sync.bytes.is_empty() {
                return Err(ConfigError::EmptySyncMarker);
            }
            fields.push(("sync", sync.offset, sync.bytes.len()));
        }

        match &self.length {
            PayloadLength::Declared(field) => {
                if field.width == 0 || field.width > 8 {
                    return Err(ConfigError::LengthWidth(field.width));
                }
                fields.push(("length", field.offset, field.width));
            }
            PayloadLength::Fixed(fixed) => {
                if *fixed > max_payload {
                    return Err(ConfigError::FixedLengthTooLarge {
                        fixed: *fixed,
                        max: max_payload,
                    });
                }
            }
        }

        if let Some(checksum) = &self.checksum {
            fields.push(("checksum", checksum.offset, checksum.kind.width()));
        }

        for &(field, offset, width) in &fields {
            let fits = offset
                .checked_add(width)
                .is_some_and(|end| end <= self.width);
            if !fits {
                return Err(ConfigError::FieldOutOfBounds {
                    field,
                    offset,
                    width,
                    header_width: self.width,
                });
            }
        }

        for (i, &(first, a_off, a_width)) in fields.iter().enumerate() {
            for &(second, b_off, b_width) in &fields[i + 1..] {
                if a_off < b_off + b_width && b_off < a_off + a_width {
                    return Err(ConfigError::FieldsOverlap { first, second });
                }
            }
        }

        Ok(())
    }

    /// Interpret a header window of exactly `self.width` bytes.
    ///
    /// The layout must already have passed [`HeaderLayout::validate`].
    pub(crate) fn parse(
        &self,
        header: &[u8],
        max_payload: usize,
    ) -> std::result::Result<ParsedHeader, HeaderFault> {
        debug_assert_eq!(header.len(), self.width);

        if let Some(sync) = &self.sync {
            if header[sync.offset..sync.offset + sync.bytes.len()] != sync.bytes[..] {
                return Err(HeaderFault::SyncMismatch);
            }
        }

        let payload_len = match &self.length {
            PayloadLength::Fixed(n) => *n,
            PayloadLength::Declared(field) => {
                let declared = field
                    .order
                    .read_uint(&header[field.offset..field.offset + field.width]);
                let payload = if field.includes_header {
                    declared.checked_sub(self.width as u64)
                } else {
                    Some(declared)
                };
                match payload.and_then(|p| usize::try_from(p).ok()) {
                    Some(p) if p <= max_payload => p,
                    _ => return Err(HeaderFault::LengthOutOfRange { declared }),
                }
            }
        };

        let checksum = self
            .checksum
            .as_ref()
            .map(|field| field.order.read_uint(&header[field.range()]) as u32);

        Ok(ParsedHeader {
            payload_len,
            checksum,
        })
    }

    /// Checksum of a packet as the layout defines it, or `None` when the
    /// layout carries no checksum. Same precondition as `parse`.
    pub(crate) fn checksum_of(&self, header: &[u8], payload: &[u8]) -> Option<u32> {
        let field = self.checksum.as_ref()?;
        let value = match field.coverage {
            Coverage::Payload => field.kind.compute([payload]),
            Coverage::Frame => {
                let range = field.range();
                field
                    .kind
                    .compute([&header[..range.start], &header[range.end..], payload])
            }
        };
        Some(value)
    }

    /// Build the header for an outbound payload.
    ///
    /// Header bytes not claimed by a field are zero.
    pub fn encode_header(&self, payload: &[u8], max_payload: usize) -> Result<Vec<u8>> {
        self.validate(max_payload)?;

        let mut header = vec![0u8; self.width];

        if let Some(sync) = &self.sync {
            header[sync.offset..sync.offset + sync.bytes.len()].copy_from_slice(&sync.bytes);
        }

        match &self.length {
            PayloadLength::Fixed(n) => {
                if payload.len() != *n {
                    return Err(FrameError::PayloadLengthMismatch {
                        size: payload.len(),
                        expected: *n,
                    });
                }
            }
            PayloadLength::Declared(field) => {
                let header_part = if field.includes_header { self.width } else { 0 };
                let field_max = field.max_value().saturating_sub(header_part as u64);
                let max = usize::try_from(field_max)
                    .unwrap_or(usize::MAX)
                    .min(max_payload);
                if payload.len() > max {
                    return Err(FrameError::PayloadTooLarge {
                        size: payload.len(),
                        max,
                    });
                }
                let declared = (payload.len() + header_part) as u64;
                field.order.write_uint(
                    declared,
                    &mut header[field.offset..field.offset + field.width],
                );
            }
        }

        if let Some(field) = &self.checksum {
            if let Some(value) = self.checksum_of(&header, payload) {
                field
                    .order
                    .write_uint(u64::from(value), &mut header[field.range()]);
            }
        }

        Ok(header)
    }
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self::length_prefixed_sum8()
    }
}
