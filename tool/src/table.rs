// Licensed under the Apache-2.0 license

use anyhow::{anyhow, bail, Result};
use ramdisk_table::{
    encode_name, RamdiskType, VendorRamdiskTableEntry, VENDOR_RAMDISK_NAME_SIZE,
    VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE, VENDOR_RAMDISK_TABLE_ENTRY_SIZE,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zerocopy::{FromBytes, FromZeros, IntoBytes};

/// Maximum usable name length. One byte of the fixed buffer is reserved for
/// the terminator.
pub const MAX_NAME_LEN: usize = VENDOR_RAMDISK_NAME_SIZE - 1;

/// How a new entry's board id vector is produced: copied from a specific
/// entry, then patched word by word. With neither set, the vector is
/// inherited from the first entry in the table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BoardIdSpec {
    pub copy_from: Option<usize>,
    pub words: Vec<(usize, u32)>,
}

/// Resolves the payload blob for a named entry. The `<name>.cpio` convention
/// is owned by the boot-image tooling; only the directory root varies.
pub fn payload_path(ramdisk_dir: &Path, name: &str) -> PathBuf {
    ramdisk_dir.join(format!("{}.cpio", name))
}

/// In-memory vendor ramdisk table: an insertion-ordered sequence of fixed
/// width records. The on-disk form is `entry_count() * 108` bytes, records
/// back to back in sequence order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RamdiskTable {
    entries: Vec<VendorRamdiskTableEntry>,
}

impl RamdiskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a table file and slices it into fixed-width records. A trailing
    /// chunk shorter than one record is dropped.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .map_err(|e| anyhow!("Cannot read table file '{}': {}", path.display(), e))?;
        let mut entries = Vec::with_capacity(data.len() / VENDOR_RAMDISK_TABLE_ENTRY_SIZE);
        for chunk in data.chunks_exact(VENDOR_RAMDISK_TABLE_ENTRY_SIZE) {
            let entry = VendorRamdiskTableEntry::read_from_bytes(chunk)
                .map_err(|_| anyhow!("Failed to parse table entry"))?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// Recreates the target file and writes every record in sequence order as
    /// raw bytes, no separators. Existing content is truncated.
    pub fn dump(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)
            .map_err(|e| anyhow!("Unable to create file {}: {}", path.display(), e))?;
        for entry in &self.entries {
            file.write_all(entry.as_bytes())?;
        }
        Ok(())
    }

    /// Appends an entry for the payload named `name`, sized from the blob
    /// resolved under `ramdisk_dir` and placed at the sum of all current
    /// entry sizes. Every check runs before the table is touched.
    pub fn add(
        &mut self,
        name: &str,
        ramdisk_type: RamdiskType,
        board_id: &BoardIdSpec,
        ramdisk_dir: &Path,
    ) -> Result<()> {
        if name.len() > MAX_NAME_LEN {
            bail!(
                "Name '{}' is too long. Maximal length is {} characters.",
                name,
                MAX_NAME_LEN
            );
        }
        if self.name_exists(name) {
            bail!("An entry with name '{}' already exists.", name);
        }
        let file_name = payload_path(ramdisk_dir, name);
        let metadata = fs::metadata(&file_name)
            .map_err(|e| anyhow!("Cannot stat ramdisk '{}': {}", file_name.display(), e))?;

        let mut entry = VendorRamdiskTableEntry::new_zeroed();
        entry.ramdisk_size = metadata.len() as u32;
        entry.ramdisk_offset = self.entries.iter().map(|e| e.ramdisk_size).sum();
        entry.ramdisk_type = ramdisk_type as u32;
        entry.ramdisk_name = encode_name(name);
        entry.board_id = self.resolve_board_id(board_id)?;
        self.entries.push(entry);
        Ok(())
    }

    fn resolve_board_id(
        &self,
        spec: &BoardIdSpec,
    ) -> Result<[u32; VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE]> {
        let mut board_id = match spec.copy_from {
            Some(index) => match self.entries.get(index) {
                Some(entry) => entry.board_id,
                None => bail!("No entry {} to copy the board id from.", index),
            },
            None => match self.entries.first() {
                Some(first) => first.board_id,
                None => [0; VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE],
            },
        };
        for &(slot, value) in &spec.words {
            if slot >= VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE {
                bail!(
                    "Board id slot {} is out of range (0..{}).",
                    slot,
                    VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE
                );
            }
            board_id[slot] = value;
        }
        Ok(board_id)
    }

    /// Removes the first entry whose stored name matches `name` over the full
    /// fixed-width buffer. Offsets of later entries are left as they were.
    pub fn rm(&mut self, name: &str) -> Result<()> {
        let needle = encode_name(name);
        match self.entries.iter().position(|e| e.ramdisk_name == needle) {
            Some(index) => {
                self.entries.remove(index);
                Ok(())
            }
            None => bail!("No entry with name '{}' found.", name),
        }
    }

    /// Removes the entry at the given zero-based position.
    pub fn rm_at(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            bail!(
                "No entry {} in a table of {} entries.",
                index,
                self.entries.len()
            );
        }
        self.entries.remove(index);
        Ok(())
    }

    pub fn name_exists(&self, name: &str) -> bool {
        let needle = encode_name(name);
        self.entries.iter().any(|e| e.ramdisk_name == needle)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Panics if `index` is out of range; use `entry_count` to stay inside.
    pub fn entry_at(&self, index: usize) -> &VendorRamdiskTableEntry {
        &self.entries[index]
    }

    pub fn entries(&self) -> &[VendorRamdiskTableEntry] {
        &self.entries
    }

    /// Writes a human-readable listing of every entry. Diagnostic output
    /// only; nothing parses this.
    pub fn print<W: Write>(&self, out: &mut W) -> Result<()> {
        for (index, entry) in self.entries.iter().enumerate() {
            let name = String::from_utf8_lossy(&entry.ramdisk_name);
            writeln!(out, "entry {}:", index)?;
            writeln!(out, "    name:   {}", name.trim_end_matches('\0'))?;
            writeln!(
                out,
                "    type:   {}",
                RamdiskType::name_of(entry.ramdisk_type)
            )?;
            writeln!(out, "    offset: {}", entry.ramdisk_offset)?;
            writeln!(out, "    size:   {}", entry.ramdisk_size)?;
            write!(out, "    board id:")?;
            for word in &entry.board_id {
                write!(out, " {:#010x}", word)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
