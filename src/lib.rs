//! flatfs is a flat, directory-less block filesystem contained in a single
//! regular file acting as a virtual disk. No permissions, timestamps, or
//! other advanced features; a fixed number of files, each capped at twelve
//! direct blocks.
//!
//! Linear image layout:
//! - Superblock
//! - Block bitmap
//! - Inode table
//! - Data blocks
//!
//! Layers, from bottom to top:
//! 1. Disk: positioned block I/O over the backing file.
//! 2. Bitmap / inode table: free-space map and file records.
//! 3. FileSystem: lifecycle plus the file operations, on a mounted context.
//! 4. api: optional process-wide single-mount surface with integer codes.

mod bitmap;
pub mod constants;
mod disk;
mod error;
mod fs;
mod layout;
mod table;

pub mod api;

pub use bitmap::Bitmap;
pub use error::{FsError, Result};
pub use fs::FileSystem;
pub use layout::{FileStat, Inode, Superblock};

pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{FsError, Result};
    pub use crate::fs::FileSystem;
    pub use crate::layout::{FileStat, Superblock};
}
