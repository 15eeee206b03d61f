//! Login integration shim.
//!
//! Runs one ping-verify exchange against the user's prover agent and folds
//! every possible failure into a closed outcome set, so a login stack can
//! branch on the outcome without inspecting error chains: configuration
//! problems are not authentication failures, and a dead agent is neither.

use std::path::PathBuf;

use tracing::{debug, warn};

/// Authentication outcome of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The agent proved a valid credential for the user
    Granted,
    /// The exchange ran but verification rejected
    Denied,
    /// No agent could be reached over the socket
    Unavailable,
    /// The shim itself is misconfigured (bad key file, no socket path)
    Misconfigured,
}

/// Shim configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Master public key file to verify against
    pub public_key_path: PathBuf,
    /// Agent socket path; falls back to `IBI_AUTH_SOCK` when unset
    pub socket_path: Option<PathBuf>,
}

/// Authenticate `user` with one ping-verify exchange.
pub fn authenticate(config: &Config, user: &str) -> AuthOutcome {
    let socket = match config
        .socket_path
        .clone()
        .or_else(ibi_agent::default_socket_path)
    {
        Some(path) => path,
        None => {
            warn!("no agent socket path configured");
            return AuthOutcome::Misconfigured;
        }
    };
    let mpk = match ibi_keyfile::load_public_key(&config.public_key_path) {
        Ok(key) => key,
        Err(err) => {
            warn!(%err, "public key unusable");
            return AuthOutcome::Misconfigured;
        }
    };
    match ibi_agent::ping_verify(&mpk, user.as_bytes(), &socket) {
        Ok(()) => {
            debug!(user, "authentication granted");
            AuthOutcome::Granted
        }
        Err(ibi_agent::Error::Socket(err)) | Err(ibi_agent::Error::Connection(err)) => {
            warn!(%err, "agent unreachable");
            AuthOutcome::Unavailable
        }
        Err(ibi_agent::Error::Core(err)) => {
            debug!(user, %err, "authentication denied");
            AuthOutcome::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibi_agent::Agent;
    use ibi_core::{ibi, Algorithm, SecretKey};
    use std::time::{SystemTime, UNIX_EPOCH};
    use std::{env, fs, thread};

    fn temp_path(tag: &str, suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir().join(format!(
            "ibi-login-{tag}-{}-{nanos}{suffix}",
            std::process::id()
        ))
    }

    #[test]
    fn outcome_mapping() {
        let msk = SecretKey::generate(Algorithm::Heng04);
        let mpk = msk.public_key();
        let credential = ibi::issue(&msk, b"alice").unwrap();

        let pk_path = temp_path("pk", "");
        ibi_keyfile::save_public_key(&pk_path, &mpk).unwrap();

        // missing key file
        let missing = Config {
            public_key_path: temp_path("absent", ""),
            socket_path: Some(temp_path("sock", ".sock")),
        };
        assert_eq!(authenticate(&missing, "alice"), AuthOutcome::Misconfigured);

        // nobody listening
        let dead = Config {
            public_key_path: pk_path.clone(),
            socket_path: Some(temp_path("dead", ".sock")),
        };
        assert_eq!(authenticate(&dead, "alice"), AuthOutcome::Unavailable);

        // live agent: the honest user gets in, an impostor does not
        let sock_path = temp_path("live", ".sock");
        let agent = Agent::bind(credential, &sock_path).unwrap();
        let server = thread::spawn(move || {
            for _ in 0..2 {
                agent.serve_one().unwrap();
            }
        });
        let live = Config {
            public_key_path: pk_path.clone(),
            socket_path: Some(sock_path),
        };
        assert_eq!(authenticate(&live, "alice"), AuthOutcome::Granted);
        assert_eq!(authenticate(&live, "mallory"), AuthOutcome::Denied);
        server.join().unwrap();

        let _ = fs::remove_file(pk_path);
    }
}
