use std::fs;
use std::io;
use std::path::Path;

use super::{DictMap, SnapshotError};

pub const MAGIC: &[u8; 4] = b"CDMP";
pub const VERSION: u8 = 1;

impl DictMap {
    /// Serialize to bytes (CDMP format): magic, version, bincode list of tokens.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let tokens: Vec<&str> = self.iter().map(|(_, token)| token).collect();
        let body = bincode::serialize(&tokens).map_err(SnapshotError::Serialize)?;

        let mut buf = Vec::with_capacity(5 + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Deserialize from bytes (CDMP format). Every token must decode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() < 5 {
            return Err(SnapshotError::InvalidHeader);
        }
        if &bytes[0..4] != MAGIC {
            return Err(SnapshotError::InvalidMagic);
        }
        if bytes[4] != VERSION {
            return Err(SnapshotError::UnsupportedVersion(bytes[4]));
        }
        let tokens: Vec<String> =
            bincode::deserialize(&bytes[5..]).map_err(SnapshotError::Deserialize)?;

        let mut map = Self::new();
        for token in tokens {
            let entry = crate::item::decode(&token)?;
            map.put_encoded(&entry.code, token);
        }
        Ok(map)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Open from file, returning an empty map if the file doesn't exist.
    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        match fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }
}
