use std::fs::{File, OpenOptions};
use std::io::prelude::*;
use std::io::SeekFrom;
use std::path::Path;

use crate::constants::*;
use crate::error::{FsError, Result};

/// The backing image file. All I/O is positioned per call against absolute
/// block offsets; no cursor state is shared between callers.
pub struct Disk {
    file: File,
    blocks: usize, // number of blocks in the image
    reads: usize,  // number of reads performed
    writes: usize, // number of writes performed
}

impl Disk {
    /// Create or truncate the image at `path` and size it to exactly
    /// `nblocks * BLOCK_SIZE` bytes.
    pub fn create<P: AsRef<Path>>(path: P, nblocks: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len((nblocks * BLOCK_SIZE) as u64)?;
        Ok(Disk {
            file,
            blocks: nblocks,
            reads: 0,
            writes: 0,
        })
    }

    /// Open an existing image read/write.
    pub fn open<P: AsRef<Path>>(path: P, nblocks: usize) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Disk {
            file,
            blocks: nblocks,
            reads: 0,
            writes: 0,
        })
    }

    /// Number of blocks in the image.
    pub fn size(&self) -> usize {
        self.blocks
    }

    /// Read `buf.len()` bytes (at most one block) from the start of `block`.
    pub fn read(&mut self, block: usize, buf: &mut [u8]) -> Result<()> {
        self.sanity_check(block, buf.len())?;
        self.file.seek(SeekFrom::Start((block * BLOCK_SIZE) as u64))?;
        self.file.read_exact(buf)?;
        self.reads += 1;
        Ok(())
    }

    /// Write `buf.len()` bytes (at most one block) at the start of `block`.
    pub fn write(&mut self, block: usize, buf: &[u8]) -> Result<()> {
        self.sanity_check(block, buf.len())?;
        self.file.seek(SeekFrom::Start((block * BLOCK_SIZE) as u64))?;
        self.file.write_all(buf)?;
        self.writes += 1;
        Ok(())
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    fn sanity_check(&self, block: usize, len: usize) -> Result<()> {
        if block >= self.blocks || len > BLOCK_SIZE {
            return Err(FsError::InvalidBlockId);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = Disk::create(dir.path().join("image"), 16).unwrap();
        assert_eq!(disk.size(), 16);

        let payload = [0xabu8; BLOCK_SIZE];
        disk.write(3, &payload).unwrap();
        let mut back = [0u8; BLOCK_SIZE];
        disk.read(3, &mut back).unwrap();
        assert_eq!(back, payload);
        assert_eq!(disk.reads(), 1);
        assert_eq!(disk.writes(), 1);
    }

    #[test]
    fn partial_block_io() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = Disk::create(dir.path().join("image"), 4).unwrap();
        disk.write(1, b"hello").unwrap();
        let mut back = [0u8; 5];
        disk.read(1, &mut back).unwrap();
        assert_eq!(&back, b"hello");
    }

    #[test]
    fn out_of_range_block_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = Disk::create(dir.path().join("image"), 4).unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(
            disk.read(4, &mut buf),
            Err(FsError::InvalidBlockId)
        ));
        assert!(matches!(disk.write(9, &buf), Err(FsError::InvalidBlockId)));
    }
}
