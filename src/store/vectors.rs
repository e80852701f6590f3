//! Memory-mapped flat vector file, one per collection.
//!
//! Layout (little-endian):
//! - header: magic `RVEC`, format version `u32`, dimension `u32`, reserved `u32`
//! - records: chunk id `u32` followed by `dimension` `f32` values
//!
//! Records are only ever appended; the map is refreshed after each write.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::error::{StoreError, StoreResult};
use super::types::ChunkId;

const MAGIC: &[u8; 4] = b"RVEC";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

/// Append-only vector storage backed by a memory map.
#[derive(Debug)]
pub struct VectorFile {
    path: PathBuf,
    dimension: usize,
    mmap: Mmap,
}

impl VectorFile {
    /// Open an existing vector file or create an empty one.
    pub fn open_or_create(path: impl AsRef<Path>, dimension: usize) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::open(path);
        }

        if dimension == 0 || dimension > u32::MAX as usize {
            return Err(StoreError::VectorFile(format!(
                "invalid vector dimension {dimension}"
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        header.extend_from_slice(&(dimension as u32).to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());

        let mut file = File::create(path)?;
        file.write_all(&header)?;
        file.sync_all()?;

        Self::open(path)
    }

    /// Open an existing vector file, validating its header.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mmap = map_file(&path)?;

        if mmap.len() < HEADER_LEN || &mmap[0..4] != MAGIC {
            return Err(StoreError::VectorFile(format!(
                "{} is not a vector file",
                path.display()
            )));
        }

        let version = read_u32(&mmap, 4);
        if version != FORMAT_VERSION {
            return Err(StoreError::VectorFile(format!(
                "{}: unsupported format version {version}",
                path.display()
            )));
        }

        let dimension = read_u32(&mmap, 8) as usize;
        let file = Self {
            path,
            dimension,
            mmap,
        };

        if dimension == 0 || (file.mmap.len() - HEADER_LEN) % file.record_len() != 0 {
            return Err(StoreError::VectorFile(format!(
                "{} is truncated or corrupt",
                file.path.display()
            )));
        }

        Ok(file)
    }

    /// Vector dimension of every record.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn vector_count(&self) -> usize {
        (self.mmap.len() - HEADER_LEN) / self.record_len()
    }

    /// Size of the file in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Append vectors and refresh the map.
    pub fn write_batch(&mut self, vectors: &[(ChunkId, &[f32])]) -> StoreResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::with_capacity(vectors.len() * self.record_len());
        for (id, vector) in vectors {
            if vector.len() != self.dimension {
                return Err(StoreError::VectorFile(format!(
                    "vector for chunk {id} has {} values, file dimension is {}",
                    vector.len(),
                    self.dimension
                )));
            }

            buf.extend_from_slice(&id.get().to_le_bytes());
            for value in *vector {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(&buf)?;
        file.sync_data()?;

        self.mmap = map_file(&self.path)?;
        Ok(())
    }

    /// Read every stored vector in insertion order.
    pub fn read_all_vectors(&self) -> Vec<(ChunkId, Vec<f32>)> {
        self.iter()
            .filter_map(|(id, vector)| id.map(|id| (id, vector)))
            .collect()
    }

    fn iter(&self) -> impl Iterator<Item = (Option<ChunkId>, Vec<f32>)> + '_ {
        self.mmap[HEADER_LEN..]
            .chunks_exact(self.record_len())
            .map(|record| {
                let id = ChunkId::from_u32(read_u32(record, 0));
                let vector = record[4..]
                    .chunks_exact(4)
                    .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                    .collect();
                (id, vector)
            })
    }

    fn record_len(&self) -> usize {
        4 + self.dimension * 4
    }
}

fn map_file(path: &Path) -> StoreResult<Mmap> {
    let file = File::open(path)?;
    // SAFETY: records are only appended through `write_batch`, which remaps
    // afterwards, and the store has a single writing process.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(n: u32) -> ChunkId {
        ChunkId::from_u32(n).unwrap()
    }

    #[test]
    fn test_create_write_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors").join("docs.vec");

        let mut file = VectorFile::open_or_create(&path, 3).unwrap();
        assert_eq!(file.vector_count(), 0);
        assert_eq!(file.dimension(), 3);

        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        file.write_batch(&[(id(1), &a[..]), (id(2), &b[..])]).unwrap();

        assert_eq!(file.vector_count(), 2);
        assert_eq!(file.read_all_vectors()[1], (id(2), b.to_vec()));
        assert_eq!(file.size_bytes(), (HEADER_LEN + 2 * 16) as u64);
    }

    #[test]
    fn test_reopen_keeps_vectors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs.vec");

        {
            let mut file = VectorFile::open_or_create(&path, 2).unwrap();
            file.write_batch(&[(id(10), &[1.1, 2.2][..])]).unwrap();
            file.write_batch(&[(id(20), &[3.3, 4.4][..])]).unwrap();
        }

        // Dimension argument is ignored for existing files
        let file = VectorFile::open_or_create(&path, 8).unwrap();
        assert_eq!(file.dimension(), 2);

        let all = file.read_all_vectors();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], (id(10), vec![1.1, 2.2]));
        assert_eq!(all[1], (id(20), vec![3.3, 4.4]));
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = VectorFile::open_or_create(temp_dir.path().join("d.vec"), 2).unwrap();

        let result = file.write_batch(&[(id(1), &[1.0, 2.0, 3.0][..])]);
        assert!(matches!(result, Err(StoreError::VectorFile(_))));
        assert_eq!(file.vector_count(), 0);
    }

    #[test]
    fn test_rejects_foreign_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("junk.vec");
        std::fs::write(&path, b"not a vector file at all").unwrap();

        assert!(matches!(VectorFile::open(&path), Err(StoreError::VectorFile(_))));
    }

    #[test]
    fn test_detects_truncation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.vec");
        {
            let mut file = VectorFile::open_or_create(&path, 2).unwrap();
            file.write_batch(&[(id(1), &[1.0, 2.0][..])]).unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(matches!(VectorFile::open(&path), Err(StoreError::VectorFile(_))));
    }
}
