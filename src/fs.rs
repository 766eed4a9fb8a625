//! The storage engine proper: lifecycle (format, mount, unmount) and the
//! file operations over a mounted image. A `FileSystem` value *is* the
//! mounted state; operations exist only on it, and dropping it releases the
//! backing file. Every operation works against the persistent structures
//! directly, so the image is always in the state a fresh mount would see.

use std::fmt::Write as _;
use std::path::Path;

use log::{debug, info, warn};

use crate::bitmap::Bitmap;
use crate::constants::*;
use crate::disk::Disk;
use crate::error::{FsError, Result};
use crate::layout::{FileStat, Inode, Superblock};
use crate::table::InodeTable;

pub struct FileSystem {
    disk: Disk,
}

impl FileSystem {
    /// Create or truncate the image at `path`, size it to exactly
    /// `MAX_BLOCKS * BLOCK_SIZE` bytes and write the canonical empty
    /// filesystem. The handle is released before returning; nothing is
    /// mounted afterwards.
    pub fn format<P: AsRef<Path>>(path: P) -> Result<()> {
        let mut disk = Disk::create(&path, MAX_BLOCKS)?;

        write_superblock(&mut disk, &Superblock::formatted())?;
        write_bitmap(&mut disk, &Bitmap::formatted())?;
        InodeTable::empty().store(&mut disk)?;

        info!(
            "formatted {} ({} blocks, {} inodes)",
            path.as_ref().display(),
            MAX_BLOCKS,
            MAX_FILES
        );
        Ok(())
    }

    /// Open an existing image read/write and validate it. The checks reject
    /// gross structural faults only; a used image with allocated data blocks
    /// is acceptable.
    pub fn mount<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut disk = Disk::open(&path, MAX_BLOCKS)?;

        let sb = read_superblock(&mut disk)?;
        if !sb.geometry_matches() {
            return Err(FsError::InvalidImage("superblock geometry mismatch"));
        }

        let map = read_bitmap(&mut disk)?;
        if !map.reserved_intact() {
            return Err(FsError::InvalidImage("reserved blocks not marked used"));
        }

        let table = InodeTable::load(&mut disk)?;
        if table.iter().any(|ino| ino.used && ino.size < 0) {
            return Err(FsError::InvalidImage("used inode with negative size"));
        }

        info!(
            "mounted {}: {} free blocks, {} free inodes",
            path.as_ref().display(),
            sb.free_blocks,
            sb.free_inodes
        );
        Ok(FileSystem { disk })
    }

    /// Release the backing file. Never fails.
    pub fn unmount(self) {
        info!("unmounted");
    }

    /// Allocate an inode for a new, empty file. No data blocks are touched.
    pub fn create(&mut self, name: &str) -> Result<()> {
        check_name(name)?;

        let mut table = InodeTable::load(&mut self.disk)?;
        if table.find(name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let index = table.find_free().ok_or(FsError::OutOfInodes)?;

        let record = table.get_mut(index);
        *record = Inode::empty();
        record.used = true;
        record.set_name(name);
        table.store_slot(&mut self.disk, index)?;

        let mut sb = read_superblock(&mut self.disk)?;
        sb.free_inodes = sb.free_inodes.saturating_sub(1);
        write_superblock(&mut self.disk, &sb)?;

        debug!("created '{}' at inode {}", name, index);
        Ok(())
    }

    /// Remove a file, returning its inode and every data block it owned to
    /// the free pools.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        check_name(name)?;

        let mut table = InodeTable::load(&mut self.disk)?;
        let index = table.find(name).ok_or(FsError::NotFound)?;

        let owned = owned_blocks(table.get(index));
        for &block in &owned {
            self.mark_block_free(block)?;
        }
        *table.get_mut(index) = Inode::empty();
        table.store_slot(&mut self.disk, index)?;

        let mut sb = read_superblock(&mut self.disk)?;
        sb.free_blocks += owned.len() as u32;
        sb.free_inodes += 1;
        write_superblock(&mut self.disk, &sb)?;

        debug!("deleted '{}' ({} blocks freed)", name, owned.len());
        Ok(())
    }

    /// Names of used files, in table order, at most `max` of them. Output
    /// names are clamped to `MAX_FILENAME - 1` bytes and de-duplicated so a
    /// corrupt table cannot produce a misleading listing.
    pub fn list(&mut self, max: usize) -> Result<Vec<String>> {
        if max == 0 || max > MAX_FILES {
            return Err(FsError::InvalidArgument);
        }

        let table = InodeTable::load(&mut self.disk)?;
        let mut names: Vec<String> = Vec::new();
        for record in table.iter() {
            if names.len() == max {
                break;
            }
            if !record.used {
                continue;
            }
            let bytes = record.name_bytes();
            let clamped = &bytes[..bytes.len().min(MAX_FILENAME - 1)];
            let name = String::from_utf8_lossy(clamped).into_owned();
            if names.iter().any(|seen| *seen == name) {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }

    /// Overwrite the file's content with `data`. The previous allocation is
    /// released first and counts toward the space available for the new one.
    ///
    /// If the data range runs dry mid-write, the inode keeps the block
    /// prefix it acquired (so no bitmap bit is left without an owner) and
    /// the requested size, and the operation reports out-of-space. A later
    /// successful write replaces the file cleanly.
    pub fn write(&mut self, name: &str, data: &[u8]) -> Result<()> {
        check_name(name)?;
        let size = data.len();

        let mut table = InodeTable::load(&mut self.disk)?;
        let index = table.find(name).ok_or(FsError::NotFound)?;

        let need = (size + BLOCK_SIZE - 1) / BLOCK_SIZE;
        if need > MAX_DIRECT_BLOCKS {
            return Err(FsError::OutOfSpace);
        }

        let old = owned_blocks(table.get(index));

        // The counter is a cached summary; reconcile it against the bitmap
        // before deciding whether the write fits.
        let mut sb = read_superblock(&mut self.disk)?;
        let counted = read_bitmap(&mut self.disk)?.free_count();
        if counted < sb.free_blocks {
            warn!(
                "free_blocks {} ahead of bitmap ({}); correcting",
                sb.free_blocks, counted
            );
            sb.free_blocks = counted;
            write_superblock(&mut self.disk, &sb)?;
        }

        if need as u32 > sb.free_blocks + old.len() as u32 {
            return Err(FsError::OutOfSpace);
        }

        // Release the previous allocation; those blocks are fair game for
        // the new content.
        for &block in &old {
            self.mark_block_free(block)?;
        }
        table.get_mut(index).blocks = [BLOCK_SENTINEL; MAX_DIRECT_BLOCKS];
        sb.free_blocks += old.len() as u32;
        write_superblock(&mut self.disk, &sb)?;

        {
            let record = table.get_mut(index);
            record.used = true;
            record.size = size as i32;
        }

        for i in 0..need {
            let block = match self.find_free_block()? {
                Some(block) => block,
                None => {
                    table.store_slot(&mut self.disk, index)?;
                    write_superblock(&mut self.disk, &sb)?;
                    return Err(FsError::OutOfSpace);
                }
            };
            table.get_mut(index).blocks[i] = block as i32;
            self.mark_block_used(block)?;
            sb.free_blocks = sb.free_blocks.saturating_sub(1);

            let start = i * BLOCK_SIZE;
            let n = if i + 1 == need && size % BLOCK_SIZE != 0 {
                size % BLOCK_SIZE
            } else {
                BLOCK_SIZE
            };
            self.disk.write(block, &data[start..start + n])?;
            debug!("'{}': block {} <- {} bytes", name, block, n);
        }

        table.store_slot(&mut self.disk, index)?;
        write_superblock(&mut self.disk, &sb)?;
        Ok(())
    }

    /// Copy the file's content into `buf`, clamped to the stored size, and
    /// return the number of bytes copied.
    pub fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize> {
        check_name(name)?;

        let table = InodeTable::load(&mut self.disk)?;
        let index = table.find(name).ok_or(FsError::NotFound)?;
        let record = table.get(index);

        let size = buf.len().min(record.size.max(0) as usize);
        let mut copied = 0;
        for &block in record.blocks.iter().filter(|&&b| b != BLOCK_SENTINEL) {
            if copied == size {
                break;
            }
            let n = (size - copied).min(BLOCK_SIZE);
            self.disk.read(block as usize, &mut buf[copied..copied + n])?;
            copied += n;
        }
        Ok(copied)
    }

    /// Size and allocation summary for one file.
    pub fn stat(&mut self, name: &str) -> Result<FileStat> {
        check_name(name)?;

        let table = InodeTable::load(&mut self.disk)?;
        let index = table.find(name).ok_or(FsError::NotFound)?;
        let record = table.get(index);
        Ok(FileStat {
            name: String::from_utf8_lossy(record.name_bytes()).into_owned(),
            size: record.size.max(0) as u32,
            blocks: record.block_count(),
        })
    }

    /// Current `free_blocks` summary from the superblock.
    pub fn free_blocks(&mut self) -> Result<u32> {
        Ok(read_superblock(&mut self.disk)?.free_blocks)
    }

    /// Diagnostic report: superblock counters, the bitmap's own free count,
    /// and one line per used inode.
    pub fn dump(&mut self) -> Result<String> {
        let sb = read_superblock(&mut self.disk)?;
        let map = read_bitmap(&mut self.disk)?;
        let table = InodeTable::load(&mut self.disk)?;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "superblock: {}/{} blocks free, {}/{} inodes free",
            sb.free_blocks, sb.total_blocks, sb.free_inodes, sb.total_inodes
        );
        let _ = writeln!(out, "bitmap: {} data blocks free", map.free_count());
        for (index, record) in table.iter().enumerate() {
            if !record.used {
                continue;
            }
            let blocks: Vec<i32> = record
                .blocks
                .iter()
                .copied()
                .filter(|&b| b != BLOCK_SENTINEL)
                .collect();
            let _ = writeln!(
                out,
                "inode {}: '{}' size={} blocks={:?}",
                index,
                String::from_utf8_lossy(record.name_bytes()),
                record.size,
                blocks
            );
        }
        Ok(out)
    }

    // ---- bitmap allocator primitives ------------------------------------

    /// First-fit scan of the data range against the on-disk bitmap. When the
    /// scan comes up empty while the superblock still advertises free
    /// blocks, the counter is corrected to zero and persisted; the bitmap is
    /// authoritative.
    fn find_free_block(&mut self) -> Result<Option<usize>> {
        let map = read_bitmap(&mut self.disk)?;
        match map.first_free() {
            Some(block) => Ok(Some(block)),
            None => {
                let mut sb = read_superblock(&mut self.disk)?;
                if sb.free_blocks > 0 {
                    warn!(
                        "bitmap full but free_blocks = {}; correcting to 0",
                        sb.free_blocks
                    );
                    sb.free_blocks = 0;
                    write_superblock(&mut self.disk, &sb)?;
                }
                Ok(None)
            }
        }
    }

    fn mark_block_used(&mut self, block: usize) -> Result<()> {
        let mut map = read_bitmap(&mut self.disk)?;
        map.set(block);
        write_bitmap(&mut self.disk, &map)
    }

    fn mark_block_free(&mut self, block: usize) -> Result<()> {
        let mut map = read_bitmap(&mut self.disk)?;
        map.clear(block);
        write_bitmap(&mut self.disk, &map)
    }
}

// ---- persistent structure helpers ---------------------------------------

fn read_superblock(disk: &mut Disk) -> Result<Superblock> {
    let mut buf = [0u8; Superblock::ENCODED_LEN];
    disk.read(SUPERBLOCK_BLOCK, &mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

fn write_superblock(disk: &mut Disk, sb: &Superblock) -> Result<()> {
    let bytes = bincode::serialize(sb)?;
    disk.write(SUPERBLOCK_BLOCK, &bytes)
}

fn read_bitmap(disk: &mut Disk) -> Result<Bitmap> {
    let mut buf = [0u8; BITMAP_BYTES];
    disk.read(BITMAP_BLOCK, &mut buf)?;
    Ok(Bitmap::from_bytes(buf))
}

fn write_bitmap(disk: &mut Disk, map: &Bitmap) -> Result<()> {
    disk.write(BITMAP_BLOCK, map.as_bytes())
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_FILENAME || name.as_bytes().contains(&0) {
        return Err(FsError::InvalidName);
    }
    Ok(())
}

fn owned_blocks(record: &Inode) -> Vec<usize> {
    record
        .blocks
        .iter()
        .filter(|&&b| b != BLOCK_SENTINEL)
        .map(|&b| b as usize)
        .collect()
}
