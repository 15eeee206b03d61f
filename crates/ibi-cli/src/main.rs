//! `ibi` command-line interface: key generation, credential issuance and
//! delegation, validation, the prover agent, and one-shot verification.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ibi_agent::Agent;
use ibi_core::{ibi, Algorithm, SecretKey};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ibi", version, about = "Identity-based identification suite")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a master key pair
    Keygen {
        /// Scheme: heng04, chin15, vangujar19 or ancygibi
        #[arg(short, long, value_parser = parse_algorithm)]
        algorithm: Algorithm,
        /// Secret key output path; the public key lands next to it as
        /// `<path>.pub`
        #[arg(short, long)]
        secret: PathBuf,
    },
    /// Issue a credential for an identity
    Issue {
        /// Master secret key file
        #[arg(short, long)]
        secret: PathBuf,
        /// Credential output path
        #[arg(short, long)]
        user: PathBuf,
        /// Identity string to bind the credential to
        #[arg(short, long)]
        identity: String,
    },
    /// Delegate a hierarchical credential one level down
    Delegate {
        /// Parent credential file
        #[arg(short, long)]
        user: PathBuf,
        /// Child credential output path
        #[arg(short, long)]
        output: PathBuf,
        /// Child name, appended to the parent name with a dot
        #[arg(short, long)]
        name: String,
    },
    /// Validate a credential against a master public key
    Validate {
        /// Master public key file
        #[arg(short, long)]
        public: PathBuf,
        /// Credential file
        #[arg(short, long)]
        user: PathBuf,
    },
    /// Serve identification exchanges over a Unix socket
    Agent {
        /// Credential file to prove with
        #[arg(short, long)]
        user: PathBuf,
        /// Master public key file, used to validate the credential on start
        #[arg(short, long)]
        public: PathBuf,
        /// Socket path to listen on
        #[arg(long, env = ibi_agent::SOCKET_ENV)]
        socket: PathBuf,
    },
    /// Dial an agent and verify one identification exchange
    Pingv {
        /// Master public key file
        #[arg(short, long)]
        public: PathBuf,
        /// Identity to verify
        #[arg(short, long)]
        identity: String,
        /// Socket path to dial
        #[arg(long, env = ibi_agent::SOCKET_ENV)]
        socket: PathBuf,
    },
}

fn parse_algorithm(value: &str) -> std::result::Result<Algorithm, String> {
    match value {
        "heng04" | "0" => Ok(Algorithm::Heng04),
        "chin15" | "1" => Ok(Algorithm::Chin15),
        "vangujar19" | "2" => Ok(Algorithm::Vangujar19),
        "ancygibi" | "3" => Ok(Algorithm::Ancygibi),
        other => Err(format!("unknown algorithm `{other}`")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Keygen { algorithm, secret } => {
            let msk = SecretKey::generate(algorithm);
            ibi_keyfile::save_secret_key(&secret, &msk).context("writing secret key")?;
            let mut public = secret.clone().into_os_string();
            public.push(".pub");
            ibi_keyfile::save_public_key(&public, &msk.public_key())
                .context("writing public key")?;
            info!(%algorithm, secret = %secret.display(), "generated master key pair");
        }
        Command::Issue {
            secret,
            user,
            identity,
        } => {
            let msk = ibi_keyfile::load_secret_key(&secret).context("loading secret key")?;
            let credential = ibi::issue(&msk, identity.as_bytes()).context("issuing credential")?;
            ibi_keyfile::save_user_key(&user, &credential).context("writing credential")?;
            info!(identity, user = %user.display(), "issued credential");
        }
        Command::Delegate { user, output, name } => {
            let parent = ibi_keyfile::load_user_key(&user).context("loading parent credential")?;
            let child = ibi::delegate(&parent, name.as_bytes()).context("delegating")?;
            ibi_keyfile::save_user_key(&output, &child).context("writing child credential")?;
            info!(
                fqn = %String::from_utf8_lossy(child.fqn()),
                level = child.level(),
                "delegated credential"
            );
        }
        Command::Validate { public, user } => {
            let mpk = ibi_keyfile::load_public_key(&public).context("loading public key")?;
            let credential = ibi_keyfile::load_user_key(&user).context("loading credential")?;
            ibi::validate(&mpk, &credential).context("credential invalid")?;
            info!(
                identity = %String::from_utf8_lossy(credential.identity()),
                "credential valid"
            );
        }
        Command::Agent {
            user,
            public,
            socket,
        } => {
            let mpk = ibi_keyfile::load_public_key(&public).context("loading public key")?;
            let credential = ibi_keyfile::load_user_key(&user).context("loading credential")?;
            ibi::validate(&mpk, &credential).context("credential invalid for this key")?;
            let agent = Agent::bind(credential, &socket).context("binding socket")?;
            agent.serve().context("agent terminated")?;
        }
        Command::Pingv {
            public,
            identity,
            socket,
        } => {
            let mpk = ibi_keyfile::load_public_key(&public).context("loading public key")?;
            match ibi_agent::ping_verify(&mpk, identity.as_bytes(), &socket) {
                Ok(()) => info!(identity, "identification accepted"),
                Err(err) => bail!("identification failed: {err}"),
            }
        }
    }
    Ok(())
}
