//! On-disk metadata records. Both records are serialized with bincode's
//! fixed-width little-endian encoding: the superblock at the head of block 0,
//! inode records in fixed 128-byte slots across the table blocks.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Accounting header persisted in block 0. The free counters are a cached
/// summary of the bitmap and inode table; the bitmap stays authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    pub total_blocks: u32,
    pub block_size: u32,
    pub free_blocks: u32,
    pub total_inodes: u32,
    pub free_inodes: u32,
}

impl Superblock {
    /// Encoded width: five u32 fields, fixed-width encoding.
    pub const ENCODED_LEN: usize = 5 * 4;

    /// Canonical freshly-formatted superblock.
    pub fn formatted() -> Self {
        Superblock {
            total_blocks: MAX_BLOCKS as u32,
            block_size: BLOCK_SIZE as u32,
            free_blocks: (MAX_BLOCKS - RESERVED_BLOCKS) as u32,
            total_inodes: MAX_FILES as u32,
            free_inodes: MAX_FILES as u32,
        }
    }

    /// Whether the capacity constants match this build's geometry.
    pub fn geometry_matches(&self) -> bool {
        self.total_blocks == MAX_BLOCKS as u32
            && self.block_size == BLOCK_SIZE as u32
            && self.total_inodes == MAX_FILES as u32
    }
}

/// One file record. `size` stays signed so mount can reject a table whose
/// used records carry negative sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Inode {
    pub used: bool,
    pub name: [u8; MAX_FILENAME],
    pub size: i32,
    pub blocks: [i32; MAX_DIRECT_BLOCKS],
}

impl Inode {
    pub fn empty() -> Self {
        Inode {
            used: false,
            name: [0; MAX_FILENAME],
            size: 0,
            blocks: [BLOCK_SENTINEL; MAX_DIRECT_BLOCKS],
        }
    }

    /// Name bytes up to the first NUL, or the whole field if none.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_FILENAME);
        &self.name[..end]
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    /// Copy `name` into the fixed field, truncated to the field width and
    /// zero-padded.
    pub fn set_name(&mut self, name: &str) {
        self.name = [0; MAX_FILENAME];
        let n = name.len().min(MAX_FILENAME);
        self.name[..n].copy_from_slice(&name.as_bytes()[..n]);
    }

    /// Count of allocated (non-sentinel) direct pointers.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|&&b| b != BLOCK_SENTINEL).count()
    }
}

/// Size and allocation summary for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub name: String,
    pub size: u32,
    pub blocks: usize,
}
