// Licensed under the Apache-2.0 license
#![no_std]

use core::fmt;
use core::str::FromStr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const VENDOR_RAMDISK_NAME_SIZE: usize = 32;
pub const VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE: usize = 16;

/// One fixed-width descriptor for a ramdisk blob packed into the vendor boot
/// image. Field order, widths, and the 108-byte total are ABI: the boot-image
/// assembler consumes these records verbatim in native byte order, and a
/// table file is a bare concatenation of them with no header or padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct VendorRamdiskTableEntry {
    pub ramdisk_size: u32,
    pub ramdisk_offset: u32,
    pub ramdisk_type: u32,
    pub ramdisk_name: [u8; VENDOR_RAMDISK_NAME_SIZE],
    pub board_id: [u32; VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE],
}

pub const VENDOR_RAMDISK_TABLE_ENTRY_SIZE: usize =
    core::mem::size_of::<VendorRamdiskTableEntry>();

/// Encodes a name the way the table stores it: truncated to the fixed buffer
/// width and NUL-padded. Name equality is defined over the full buffer, so
/// both stored names and lookup keys must go through this.
pub fn encode_name(name: &str) -> [u8; VENDOR_RAMDISK_NAME_SIZE] {
    let mut buf = [0u8; VENDOR_RAMDISK_NAME_SIZE];
    let bytes = name.as_bytes();
    let len = bytes.len().min(VENDOR_RAMDISK_NAME_SIZE);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// Category of a ramdisk payload. The code values match the vendor boot
/// image header definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RamdiskType {
    None = 0,
    Platform = 1,
    Recovery = 2,
    Dlkm = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRamdiskType;

impl RamdiskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RamdiskType::None => "none",
            RamdiskType::Platform => "platform",
            RamdiskType::Recovery => "recovery",
            RamdiskType::Dlkm => "dlkm",
        }
    }

    /// Display name for a raw type code, empty when the code is not a known
    /// type.
    pub fn name_of(code: u32) -> &'static str {
        RamdiskType::try_from(code)
            .map(|t| t.as_str())
            .unwrap_or("")
    }
}

impl TryFrom<u32> for RamdiskType {
    type Error = UnknownRamdiskType;

    fn try_from(value: u32) -> Result<Self, UnknownRamdiskType> {
        match value {
            0 => Ok(RamdiskType::None),
            1 => Ok(RamdiskType::Platform),
            2 => Ok(RamdiskType::Recovery),
            3 => Ok(RamdiskType::Dlkm),
            _ => Err(UnknownRamdiskType),
        }
    }
}

impl FromStr for RamdiskType {
    type Err = UnknownRamdiskType;

    fn from_str(s: &str) -> Result<Self, UnknownRamdiskType> {
        match s {
            "none" => Ok(RamdiskType::None),
            "platform" => Ok(RamdiskType::Platform),
            "recovery" => Ok(RamdiskType::Recovery),
            "dlkm" => Ok(RamdiskType::Dlkm),
            _ => Err(UnknownRamdiskType),
        }
    }
}

impl fmt::Display for RamdiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;

    #[test]
    fn test_entry_layout() {
        assert_eq!(VENDOR_RAMDISK_TABLE_ENTRY_SIZE, 108);
        assert_eq!(offset_of!(VendorRamdiskTableEntry, ramdisk_size), 0);
        assert_eq!(offset_of!(VendorRamdiskTableEntry, ramdisk_offset), 4);
        assert_eq!(offset_of!(VendorRamdiskTableEntry, ramdisk_type), 8);
        assert_eq!(offset_of!(VendorRamdiskTableEntry, ramdisk_name), 12);
        assert_eq!(offset_of!(VendorRamdiskTableEntry, board_id), 44);
    }

    #[test]
    fn test_entry_byte_round_trip() {
        let entry = VendorRamdiskTableEntry {
            ramdisk_size: 0x1000,
            ramdisk_offset: 0x2000,
            ramdisk_type: RamdiskType::Dlkm as u32,
            ramdisk_name: encode_name("vendor_dlkm"),
            board_id: [0xdead_beef; VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE],
        };
        let bytes = entry.as_bytes();
        assert_eq!(bytes.len(), VENDOR_RAMDISK_TABLE_ENTRY_SIZE);
        let decoded = VendorRamdiskTableEntry::read_from_bytes(bytes).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_encode_name_pads_and_truncates() {
        let short = encode_name("boot");
        assert_eq!(&short[..4], b"boot");
        assert!(short[4..].iter().all(|&b| b == 0));

        let long = "0123456789abcdef0123456789abcdefXYZ";
        let encoded = encode_name(long);
        assert_eq!(&encoded[..], &long.as_bytes()[..VENDOR_RAMDISK_NAME_SIZE]);
    }

    #[test]
    fn test_type_codes_round_trip() {
        for ty in [
            RamdiskType::None,
            RamdiskType::Platform,
            RamdiskType::Recovery,
            RamdiskType::Dlkm,
        ] {
            assert_eq!(RamdiskType::try_from(ty as u32), Ok(ty));
            assert_eq!(ty.as_str().parse::<RamdiskType>(), Ok(ty));
        }
    }

    #[test]
    fn test_unknown_type_code_has_empty_name() {
        assert_eq!(RamdiskType::try_from(4), Err(UnknownRamdiskType));
        assert_eq!(RamdiskType::name_of(4), "");
        assert_eq!(RamdiskType::name_of(RamdiskType::Recovery as u32), "recovery");
    }

    #[test]
    fn test_unknown_type_name_is_an_error() {
        assert_eq!("vendor".parse::<RamdiskType>(), Err(UnknownRamdiskType));
        assert_eq!("NONE".parse::<RamdiskType>(), Err(UnknownRamdiskType));
    }
}
