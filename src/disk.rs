use crate::{PageID, StorageError, PAGE_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Single-file page store. Page `p` lives at byte offset `p * PAGE_SIZE`.
/// Methods take `&self` so one manager can be shared across pool shards;
/// shards allocate disjoint page ids, so their blocks never overlap.
pub struct DiskManager {
    path: PathBuf,
    file: Mutex<File>,
}

impl DiskManager {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fill `buf` with the block at `page_id`. A block past the current end
    /// of file reads as all zeroes.
    pub fn read_page(&self, page_id: PageID, buf: &mut [u8]) -> Result<(), StorageError> {
        assert_eq!(buf.len(), PAGE_SIZE);
        let mut file = self.file.lock().unwrap();
        let offset = page_id as u64 * PAGE_SIZE as u64;
        if offset >= file.metadata()?.len() {
            buf.fill(0);
            return Ok(());
        }
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    /// Persist the block at `page_id`, synchronously.
    pub fn write_page(&self, page_id: PageID, buf: &[u8]) -> Result<(), StorageError> {
        assert_eq!(buf.len(), PAGE_SIZE);
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(page_id as u64 * PAGE_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }

    /// Physical-allocator bookkeeping hook; file space is not reclaimed at
    /// this layer.
    pub fn deallocate_page(&self, _page_id: PageID) {}

    pub fn num_pages(&self) -> Result<u64, StorageError> {
        let file = self.file.lock().unwrap();
        let len = file.metadata()?.len();
        debug_assert_eq!(len % PAGE_SIZE as u64, 0);
        Ok(len / PAGE_SIZE as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::temp_db_path;
    use rand::Rng;
    use std::fs::remove_file;

    #[test]
    fn write_read_round_trip() {
        let disk = DiskManager::open(temp_db_path()).unwrap();
        let mut rng = rand::thread_rng();
        let mut page0 = [0u8; PAGE_SIZE];
        let mut page1 = [0u8; PAGE_SIZE];
        let mut page2 = [0u8; PAGE_SIZE];
        for i in 0..PAGE_SIZE {
            let b0 = rng.gen::<u8>();
            let b1 = rng.gen::<u8>();
            page0[i] = b0;
            page1[i] = b1;
            page2[i] = b0 ^ b1;
        }
        disk.write_page(0, &page0).unwrap();
        disk.write_page(1, &page1).unwrap();
        disk.write_page(2, &page2).unwrap();
        assert_eq!(disk.num_pages().unwrap(), 3);
        let mut buf = [0u8; PAGE_SIZE];
        disk.read_page(2, &mut buf).unwrap();
        for i in 0..PAGE_SIZE {
            assert_eq!(buf[i], page0[i] ^ page1[i]);
        }
        remove_file(disk.path()).unwrap();
    }

    #[test]
    fn read_past_end_is_zeroed() {
        let disk = DiskManager::open(temp_db_path()).unwrap();
        let mut buf = [0xFFu8; PAGE_SIZE];
        disk.read_page(7, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        remove_file(disk.path()).unwrap();
    }

    #[test]
    fn sparse_write_extends_file() {
        let disk = DiskManager::open(temp_db_path()).unwrap();
        let block = [0x42u8; PAGE_SIZE];
        disk.write_page(4, &block).unwrap();
        assert_eq!(disk.num_pages().unwrap(), 5);
        let mut buf = [0u8; PAGE_SIZE];
        disk.read_page(4, &mut buf).unwrap();
        assert_eq!(buf, block);
        // the skipped blocks read back as zeroes
        disk.read_page(1, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        remove_file(disk.path()).unwrap();
    }
}
