//! Unix-socket prover agent and its dialing verifier.
//!
//! The wire protocol is three fixed-length frames over one connected
//! stream socket: the prover writes the commitment, reads the challenge,
//! writes the response, and the connection ends. Frame lengths are fixed
//! by the algorithm (and, for hierarchical credentials, the delegation
//! level), both of which the peers know out of band from the public key
//! and the claimed identity. The agent is a blocking accept loop serving
//! one connection at a time; every connection gets a fresh prover session,
//! wiped when the exchange ends, transport failures included.

use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::{env, fs};

use ibi_core::ibi::{name_level, Prover, UserKey, Verifier};
use ibi_core::PublicKey;
use tracing::{debug, info, warn};

/// Environment variable naming the agent socket path
pub const SOCKET_ENV: &str = "IBI_AUTH_SOCK";

/// Socket path from the environment, if set
pub fn default_socket_path() -> Option<PathBuf> {
    env::var_os(SOCKET_ENV).map(PathBuf::from)
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket could not be created, bound or accepted on
    #[error("socket error: {0}")]
    Socket(#[source] std::io::Error),

    /// An established connection failed mid-exchange
    #[error("connection error: {0}")]
    Connection(#[source] std::io::Error),

    /// Protocol-level failure, verification rejection included
    #[error(transparent)]
    Core(#[from] ibi_core::Error),
}

/// Blocking prover agent bound to a Unix socket.
pub struct Agent {
    listener: UnixListener,
    credential: UserKey,
    path: PathBuf,
}

impl Agent {
    /// Bind to `path`, replacing any stale socket file left behind by a
    /// previous run.
    pub fn bind(credential: UserKey, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let _ = fs::remove_file(&path);
        let listener = UnixListener::bind(&path).map_err(Error::Socket)?;
        Ok(Agent {
            listener,
            credential,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept one connection and run one exchange. An accept failure is
    /// returned; a mid-exchange failure only ends that connection.
    pub fn serve_one(&self) -> Result<()> {
        let (mut stream, _) = self.listener.accept().map_err(Error::Socket)?;
        self.exchange(&mut stream)
    }

    /// Serve connections until the socket itself fails. Failed exchanges
    /// are logged and the loop keeps going.
    pub fn serve(&self) -> Result<()> {
        info!(path = %self.path.display(), algorithm = %self.credential.algorithm(), "agent listening");
        loop {
            match self.serve_one() {
                Ok(()) => debug!("exchange complete"),
                Err(Error::Socket(err)) => return Err(Error::Socket(err)),
                Err(err) => warn!(%err, "exchange failed"),
            }
        }
    }

    fn exchange(&self, stream: &mut UnixStream) -> Result<()> {
        let algorithm = self.credential.algorithm();
        let (session, commitment) = Prover::new(&self.credential)?.commit()?;
        stream.write_all(&commitment).map_err(Error::Connection)?;

        let mut challenge = vec![0u8; algorithm.challenge_len()];
        stream.read_exact(&mut challenge).map_err(Error::Connection)?;

        let response = session.respond(&challenge)?;
        stream.write_all(&response).map_err(Error::Connection)?;
        Ok(())
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Dial a prover agent and run one verification exchange. Returns `Ok` only
/// if the prover holds a valid credential for `identity` under `mpk`.
pub fn ping_verify(mpk: &PublicKey, identity: &[u8], socket_path: impl AsRef<Path>) -> Result<()> {
    let algorithm = mpk.algorithm();
    let mut stream = UnixStream::connect(socket_path.as_ref()).map_err(Error::Connection)?;

    let mut commitment = vec![0u8; algorithm.commitment_len(name_level(identity))];
    stream.read_exact(&mut commitment).map_err(Error::Connection)?;

    let (session, challenge) = Verifier::new(mpk, identity)?.challenge(&commitment)?;
    stream.write_all(&challenge).map_err(Error::Connection)?;

    let mut response = vec![0u8; algorithm.response_len()];
    stream.read_exact(&mut response).map_err(Error::Connection)?;
    session.decide(&response)?;
    debug!("identification accepted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibi_core::{ibi, Algorithm, SecretKey};
    use std::thread;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_socket(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir().join(format!("ibi-agent-{tag}-{}-{nanos}.sock", std::process::id()))
    }

    #[test]
    fn exchange_over_real_socket() {
        let msk = SecretKey::generate(Algorithm::Chin15);
        let mpk = msk.public_key();
        let credential = ibi::issue(&msk, b"alice").unwrap();

        let path = temp_socket("roundtrip");
        let agent = Agent::bind(credential, &path).unwrap();
        let server = thread::spawn(move || {
            for _ in 0..2 {
                agent.serve_one().unwrap();
            }
        });

        ping_verify(&mpk, b"alice", &path).unwrap();
        // the prover completes its exchange either way; only the verifier
        // learns that the claimed identity does not match
        assert!(matches!(
            ping_verify(&mpk, b"bob", &path),
            Err(Error::Core(ibi_core::Error::Verification))
        ));
        server.join().unwrap();
    }

    #[test]
    fn hierarchical_exchange_carries_longer_frames() {
        let msk = SecretKey::generate(Algorithm::Vangujar19);
        let mpk = msk.public_key();
        let child = ibi::delegate(&ibi::issue(&msk, b"corp").unwrap(), b"eng").unwrap();

        let path = temp_socket("hier");
        let agent = Agent::bind(child, &path).unwrap();
        let server = thread::spawn(move || agent.serve_one().unwrap());
        ping_verify(&mpk, b"corp.eng", &path).unwrap();
        server.join().unwrap();
    }

    #[test]
    fn dead_socket_is_a_connection_error() {
        let mpk = SecretKey::generate(Algorithm::Heng04).public_key();
        let err = ping_verify(&mpk, b"alice", temp_socket("dead")).unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
