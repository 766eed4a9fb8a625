//! The inode table: a fixed array of records persisted contiguously in its
//! reserved block range. Lookups are linear scans; at 256 records that is
//! cheaper than any index would be.

use crate::constants::*;
use crate::disk::Disk;
use crate::error::Result;
use crate::layout::Inode;

pub struct InodeTable {
    inodes: Vec<Inode>,
}

impl InodeTable {
    /// All-free table with sentinel block pointers, as format writes it.
    pub fn empty() -> Self {
        InodeTable {
            inodes: vec![Inode::empty(); MAX_FILES],
        }
    }

    /// Read the whole table from its reserved block range.
    pub fn load(disk: &mut Disk) -> Result<Self> {
        let mut inodes = Vec::with_capacity(MAX_FILES);
        let mut buf = [0u8; BLOCK_SIZE];
        for table_block in 0..INODE_TABLE_BLOCKS {
            disk.read(INODE_TABLE_START + table_block, &mut buf)?;
            for slot in 0..INODES_PER_BLOCK {
                let off = slot * INODE_SLOT_SIZE;
                inodes.push(bincode::deserialize(&buf[off..off + INODE_SLOT_SIZE])?);
            }
        }
        Ok(InodeTable { inodes })
    }

    /// Rewrite the whole table.
    pub fn store(&self, disk: &mut Disk) -> Result<()> {
        for table_block in 0..INODE_TABLE_BLOCKS {
            self.store_block(disk, table_block)?;
        }
        Ok(())
    }

    /// Persist one record by rewriting only the table block holding it.
    pub fn store_slot(&self, disk: &mut Disk, index: usize) -> Result<()> {
        self.store_block(disk, index / INODES_PER_BLOCK)
    }

    fn store_block(&self, disk: &mut Disk, table_block: usize) -> Result<()> {
        let mut buf = [0u8; BLOCK_SIZE];
        for slot in 0..INODES_PER_BLOCK {
            let record = &self.inodes[table_block * INODES_PER_BLOCK + slot];
            let bytes = bincode::serialize(record)?;
            let off = slot * INODE_SLOT_SIZE;
            buf[off..off + bytes.len()].copy_from_slice(&bytes);
        }
        disk.write(INODE_TABLE_START + table_block, &buf)
    }

    pub fn get(&self, index: usize) -> &Inode {
        &self.inodes[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Inode {
        &mut self.inodes[index]
    }

    /// Index of the used record whose name equals `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.inodes
            .iter()
            .position(|ino| ino.used && ino.name_matches(name))
    }

    /// Lowest free slot.
    pub fn find_free(&self) -> Option<usize> {
        self.inodes.iter().position(|ino| !ino.used)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Inode> {
        self.inodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(name: &str) -> Inode {
        let mut ino = Inode::empty();
        ino.used = true;
        ino.set_name(name);
        ino
    }

    #[test]
    fn find_matches_used_records_only() {
        let mut table = InodeTable::empty();
        *table.get_mut(3) = used("a");
        let mut stale = used("b");
        stale.used = false;
        *table.get_mut(4) = stale;

        assert_eq!(table.find("a"), Some(3));
        assert_eq!(table.find("b"), None);
    }

    #[test]
    fn find_free_returns_lowest_slot() {
        let mut table = InodeTable::empty();
        assert_eq!(table.find_free(), Some(0));
        *table.get_mut(0) = used("a");
        *table.get_mut(1) = used("b");
        assert_eq!(table.find_free(), Some(2));
    }

    #[test]
    fn table_round_trips_through_the_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = Disk::create(dir.path().join("image"), MAX_BLOCKS).unwrap();

        let mut table = InodeTable::empty();
        let mut ino = used("roundtrip");
        ino.size = 100;
        ino.blocks[0] = 42;
        *table.get_mut(200) = ino;
        table.store(&mut disk).unwrap();

        let back = InodeTable::load(&mut disk).unwrap();
        assert_eq!(back.find("roundtrip"), Some(200));
        assert_eq!(back.get(200).size, 100);
        assert_eq!(back.get(200).blocks[0], 42);
        assert_eq!(back.get(200).block_count(), 1);
    }

    #[test]
    fn single_slot_store_touches_only_its_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = Disk::create(dir.path().join("image"), MAX_BLOCKS).unwrap();
        let mut table = InodeTable::empty();
        table.store(&mut disk).unwrap();

        *table.get_mut(0) = used("first");
        *table.get_mut(MAX_FILES - 1) = used("last");
        table.store_slot(&mut disk, 0).unwrap();
        table.store_slot(&mut disk, MAX_FILES - 1).unwrap();

        let back = InodeTable::load(&mut disk).unwrap();
        assert_eq!(back.find("first"), Some(0));
        assert_eq!(back.find("last"), Some(MAX_FILES - 1));
    }
}
