//! Packet checksums.

/// The checksum algorithms a header can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChecksumKind {
    /// Sum of all covered bytes, modulo 256.
    Sum8,
    /// XOR of all covered bytes.
    Xor8,
    /// CRC-32 (IEEE), as computed by `crc32fast`.
    Crc32,
}

impl ChecksumKind {
    /// Width of the checksum field in the header.
    pub fn width(self) -> usize {
        match self {
            ChecksumKind::Sum8 | ChecksumKind::Xor8 => 1,
            ChecksumKind::Crc32 => 4,
        }
    }

    /// Checksum over the concatenation of `parts`.
    pub fn compute<'a, I>(self, parts: I) -> u32
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        match self {
            ChecksumKind::Sum8 => parts
                .into_iter()
                .flatten()
                .fold(0u8, |acc, b| acc.wrapping_add(*b))
                .into(),
            ChecksumKind::Xor8 => parts
                .into_iter()
                .flatten()
                .fold(0u8, |acc, b| acc ^ b)
                .into(),
            ChecksumKind::Crc32 => {
                let mut hasher = crc32fast::Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize()
            }
        }
    }
}
