use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::checksum::{checksum_bytes, file_checksum};
use crate::validation::validate_target_path;
use crate::{ChunkStore, StoreError};

/// Disk-backed [`ChunkStore`].
///
/// Spools live under `<root>/spool/<id>.part`; committed objects under
/// `<root>/objects/<target_path>`. Both trees sit on the same filesystem
/// so publishing is a single atomic rename.
pub struct DiskStore {
    spool_dir: PathBuf,
    object_dir: PathBuf,
}

impl DiskStore {
    /// Creates a store rooted at `root`, creating both trees.
    pub fn new(root: &Path) -> Result<Self, StoreError> {
        let spool_dir = root.join("spool");
        let object_dir = root.join("objects");
        std::fs::create_dir_all(&spool_dir)?;
        std::fs::create_dir_all(&object_dir)?;
        Ok(Self {
            spool_dir,
            object_dir,
        })
    }

    fn spool_path(&self, id: &str) -> PathBuf {
        self.spool_dir.join(format!("{id}.part"))
    }

    fn object_path(&self, target: &str) -> Result<PathBuf, StoreError> {
        validate_target_path(target)?;
        Ok(self.object_dir.join(target))
    }
}

/// Reads up to `len` bytes from `file` at `offset`, clipped to `total`.
fn read_range(mut file: File, total: u64, offset: u64, len: usize) -> Result<Vec<u8>, StoreError> {
    if offset >= total {
        return Ok(Vec::new());
    }
    let n = len.min((total - offset) as usize);
    let mut buf = vec![0u8; n];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(buf)
}

impl ChunkStore for DiskStore {
    fn write_at(&self, id: &str, offset: u64, data: &[u8]) -> Result<usize, StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.spool_path(id))?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        debug!(transfer_id = %id, offset, len = data.len(), "spool write");
        Ok(data.len())
    }

    fn read_spool(&self, id: &str, offset: u64, len: usize) -> Result<Vec<u8>, StoreError> {
        let file = match File::open(self.spool_path(id)) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let total = file.metadata()?.len();
        read_range(file, total, offset, len)
    }

    fn spool_len(&self, id: &str) -> Result<u64, StoreError> {
        match std::fs::metadata(self.spool_path(id)) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn spool_checksum(&self, id: &str) -> Result<String, StoreError> {
        let path = self.spool_path(id);
        if !path.exists() {
            // An empty transfer has an empty-input digest.
            return Ok(checksum_bytes(b""));
        }
        file_checksum(&path)
    }

    fn publish(&self, id: &str, target: &str, overwrite: bool) -> Result<PathBuf, StoreError> {
        let object_path = self.object_path(target)?;
        let spool_path = self.spool_path(id);

        if !overwrite && object_path.exists() {
            return Err(StoreError::AlreadyExists(target.to_string()));
        }

        // A session may commit without ever writing (declared size 0).
        if !spool_path.exists() {
            File::create(&spool_path)?;
        }

        if let Some(parent) = object_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Rename within one filesystem: readers see the old object or the
        // complete new one, never a partial write.
        std::fs::rename(&spool_path, &object_path)?;
        debug!(transfer_id = %id, object = %target, "object committed");
        Ok(object_path)
    }

    fn discard(&self, id: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.spool_path(id)) {
            Ok(()) => {
                debug!(transfer_id = %id, "spool discarded");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_object(&self, target: &str, offset: u64, len: usize) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(target)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(target.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let total = file.metadata()?.len();
        read_range(file, total, offset, len)
    }

    fn object_len(&self, target: &str) -> Result<u64, StoreError> {
        let path = self.object_path(target)?;
        match std::fs::metadata(&path) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(target.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete_object(&self, target: &str) -> Result<(), StoreError> {
        let path = self.object_path(target)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(object = %target, "object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
