use std::{
    fmt,
    fs,
    io::{Cursor, Read, Write},
    path::{Path, PathBuf},
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ftpgate_error::{StoreError, StoreResult};
use tempfile::NamedTempFile;
use tracing::debug;

use super::txn::KeySpace;

/// Magic prefix of the credential store file: ASCII "FTPG".
pub const FILE_MAGIC: &[u8; 4] = b"FTPG";

/// Current on-disk format version.
pub const FORMAT_VERSION: u8 = 1;

/// magic + version + crc32 + payload length
const HEADER_LEN: usize = 4 + 1 + 4 + 8;

/// Durability layer under [`Store`](super::Store).
///
/// The store keeps the live key space in memory; a backend loads it once on
/// open and is handed the full key space after every committed write.
pub trait Backend: Send + Sync + fmt::Debug {
    fn load(&self) -> StoreResult<KeySpace>;

    fn persist(
        &self,
        data: &KeySpace,
    ) -> StoreResult<()>;

    fn name(&self) -> &'static str;
}

/// Nothing survives a restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBackend;

/// Single-file backend with atomic replace on every commit.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl Backend for MemoryBackend {
    fn load(&self) -> StoreResult<KeySpace> {
        Ok(KeySpace::new())
    }

    fn persist(
        &self,
        _data: &KeySpace,
    ) -> StoreResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupted(
        &self,
        reason: impl Into<String>,
    ) -> StoreError {
        StoreError::CorruptedData {
            location: self.path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn decode_file(
        &self,
        bytes: &[u8],
    ) -> StoreResult<KeySpace> {
        if bytes.len() < HEADER_LEN {
            return Err(self.corrupted("file shorter than header"));
        }

        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if &magic != FILE_MAGIC {
            return Err(self.corrupted("bad magic"));
        }

        let version = cursor.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(self.corrupted(format!("unsupported format version {version}")));
        }

        let expected_crc = cursor.read_u32::<LittleEndian>()?;
        let len = cursor.read_u64::<LittleEndian>()? as usize;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != len {
            return Err(self.corrupted(format!(
                "payload length {} does not match header {len}",
                payload.len()
            )));
        }
        if crc32fast::hash(payload) != expected_crc {
            return Err(self.corrupted("checksum mismatch"));
        }

        rmp_serde::from_slice(payload).map_err(|e| self.corrupted(e.to_string()))
    }
}

impl Backend for FileBackend {
    fn load(&self) -> StoreResult<KeySpace> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file missing, starting empty");
                return Ok(KeySpace::new());
            }
            Err(err) => return Err(err.into()),
        };

        let data = self.decode_file(&bytes)?;
        debug!(path = %self.path.display(), keys = data.len(), "Store file loaded");
        Ok(data)
    }

    fn persist(
        &self,
        data: &KeySpace,
    ) -> StoreResult<()> {
        let payload = rmp_serde::to_vec(data).map_err(|e| StoreError::SerializationFailed {
            type_name: "KeySpace".into(),
            reason: e.to_string(),
        })?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Temp file in the same directory so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let file = tmp.as_file_mut();
            file.write_all(FILE_MAGIC)?;
            file.write_u8(FORMAT_VERSION)?;
            file.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
            file.write_u64::<LittleEndian>(payload.len() as u64)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        tmp.persist(&self.path)
            .map_err(|e| StoreError::from(e.error))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
