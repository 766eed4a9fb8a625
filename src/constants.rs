//! Geometry of the disk image. Everything else in the crate is derived from
//! these values; changing them changes the on-disk format.

/// Number of bytes per block.
pub const BLOCK_SIZE: usize = 4096;

/// Total number of blocks in the image (10 MiB at 4 KiB blocks).
pub const MAX_BLOCKS: usize = 2560;

/// Capacity of the inode table.
pub const MAX_FILES: usize = 256;

/// Width of the stored name field in bytes.
pub const MAX_FILENAME: usize = 28;

/// Direct block pointers per inode. No indirect pointers, so this caps the
/// file size.
pub const MAX_DIRECT_BLOCKS: usize = 12;

// Reserved layout: block 0 superblock, block 1 bitmap, blocks 2-9 the inode
// table, data from block 10 up.
pub const SUPERBLOCK_BLOCK: usize = 0;
pub const BITMAP_BLOCK: usize = 1;
pub const INODE_TABLE_START: usize = 2;
pub const RESERVED_BLOCKS: usize = 10;
pub const DATA_START: usize = RESERVED_BLOCKS;

/// One bit per block over the whole image.
pub const BITMAP_BYTES: usize = MAX_BLOCKS / 8;

/// Fixed on-disk slot per inode record; 32 records per table block.
pub const INODE_SLOT_SIZE: usize = 128;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SLOT_SIZE;
pub const INODE_TABLE_BLOCKS: usize = MAX_FILES / INODES_PER_BLOCK;

pub const MAX_FILE_SIZE: usize = MAX_DIRECT_BLOCKS * BLOCK_SIZE;

/// Empty-pointer value in an inode's block list.
pub const BLOCK_SENTINEL: i32 = -1;
