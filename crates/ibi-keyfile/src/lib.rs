//! File storage for keys and credentials.
//!
//! One object per file: the wire envelope, base64-encoded with the
//! standard alphabet and wrapped at 64 columns. Decoding ignores
//! whitespace, so hand-edited or single-line files load the same.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ibi_core::{PublicKey, SecretKey, UserKey};
use tracing::debug;

const WRAP_COLUMNS: usize = 64;

/// Result type alias for keyfile operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File could not be read or written
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid base64
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes do not form a valid key or credential
    #[error(transparent)]
    Core(#[from] ibi_core::Error),
}

fn write_blob(path: &Path, bytes: &[u8]) -> Result<()> {
    let encoded = STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / WRAP_COLUMNS + 1);
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(WRAP_COLUMNS));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    fs::write(path, out).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote key file");
    Ok(())
}

fn read_blob(path: &Path) -> Result<Vec<u8>> {
    let text = fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

pub fn save_secret_key(path: impl AsRef<Path>, key: &SecretKey) -> Result<()> {
    write_blob(path.as_ref(), &key.to_bytes())
}

pub fn load_secret_key(path: impl AsRef<Path>) -> Result<SecretKey> {
    Ok(SecretKey::from_bytes(&read_blob(path.as_ref())?)?)
}

pub fn save_public_key(path: impl AsRef<Path>, key: &PublicKey) -> Result<()> {
    write_blob(path.as_ref(), &key.to_bytes())
}

pub fn load_public_key(path: impl AsRef<Path>) -> Result<PublicKey> {
    Ok(PublicKey::from_bytes(&read_blob(path.as_ref())?)?)
}

pub fn save_user_key(path: impl AsRef<Path>, key: &UserKey) -> Result<()> {
    write_blob(path.as_ref(), &key.to_bytes())
}

pub fn load_user_key(path: impl AsRef<Path>) -> Result<UserKey> {
    Ok(UserKey::from_bytes(&read_blob(path.as_ref())?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibi_core::{ibi, Algorithm};
    use std::env;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir().join(format!("ibi-keyfile-{tag}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn keys_round_trip_through_files() {
        let msk = SecretKey::generate(Algorithm::Chin15);
        let mpk = msk.public_key();
        let cred = ibi::issue(&msk, b"alice").unwrap();

        let sk_path = temp_path("sk");
        let pk_path = temp_path("pk");
        let uk_path = temp_path("uk");

        save_secret_key(&sk_path, &msk).unwrap();
        save_public_key(&pk_path, &mpk).unwrap();
        save_user_key(&uk_path, &cred).unwrap();

        assert_eq!(load_secret_key(&sk_path).unwrap().to_bytes(), msk.to_bytes());
        assert_eq!(load_public_key(&pk_path).unwrap().to_bytes(), mpk.to_bytes());
        let loaded = load_user_key(&uk_path).unwrap();
        assert_eq!(loaded.to_bytes(), cred.to_bytes());
        ibi::validate(&mpk, &loaded).unwrap();

        for p in [sk_path, pk_path, uk_path] {
            let _ = fs::remove_file(p);
        }
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let err = load_public_key(temp_path("missing")).unwrap_err();
        assert!(matches!(err, Error::File { .. }));
    }

    #[test]
    fn garbage_content_is_a_base64_error() {
        let path = temp_path("garbage");
        fs::write(&path, "not base64 at all!!!").unwrap();
        let err = load_public_key(&path).unwrap_err();
        assert!(matches!(err, Error::Base64(_)));
        let _ = fs::remove_file(path);
    }
}
