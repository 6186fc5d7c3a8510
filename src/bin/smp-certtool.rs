//! `smp-certtool`: provisioning helper for SMP credentials.
//!
//! * `init-root` creates a self-signed root CA (`root_ca.cert` + `root_ca.key`).
//! * `issue` signs a fresh device key with that root and writes the bootstrap
//!   layout (`root_ca.cert`, `self.cert`, `self.key`) expected by
//!   `CredentialBundle::bootstrap`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use smp::adapters::crypto::RustCryptoProvider;
use smp::config::{CredentialPaths, ROOT_CA_FILE};
use smp::{CertificateAuthority, SmpError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const ROOT_KEY_FILE: &str = "root_ca.key";

#[derive(Parser)]
#[command(name = "smp-certtool")]
#[command(about = "Generate SMP root and device credentials", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a self-signed root certificate authority
    InitRoot {
        /// Output directory
        #[arg(long)]
        out: PathBuf,
        /// Subject name of the root
        #[arg(long)]
        subject: String,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Issue a device certificate and key signed by an existing root
    Issue {
        /// Directory holding root_ca.cert and root_ca.key
        #[arg(long)]
        root_dir: PathBuf,
        /// Output directory for the bootstrap files
        #[arg(long)]
        out: PathBuf,
        /// Subject name of the device
        #[arg(long)]
        subject: String,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Smp(#[from] SmpError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} already exists (use --force to overwrite)")]
    Exists(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CliError {
    let path = path.to_path_buf();
    move |source| CliError::Io { path, source }
}

/// Secret files are created owner-only, and an overwritten file is narrowed
/// to 0600 before any secret byte reaches it.
fn write_file(path: &Path, bytes: &[u8], force: bool, secret: bool) -> Result<(), CliError> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true);
    if force {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }
    #[cfg(unix)]
    if secret {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => CliError::Exists(path.to_path_buf()),
        _ => io_err(path)(e),
    })?;
    #[cfg(unix)]
    if secret {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600)).map_err(io_err(path))?;
    }
    #[cfg(not(unix))]
    let _ = secret;
    file.write_all(bytes).map_err(io_err(path))?;
    info!(path = %path.display(), "wrote");
    Ok(())
}

fn init_root(out: &Path, subject: &str, force: bool) -> Result<(), CliError> {
    fs::create_dir_all(out).map_err(io_err(out))?;
    let ca = CertificateAuthority::generate(RustCryptoProvider, subject)?;
    write_file(&out.join(ROOT_CA_FILE), ca.certificate(), force, false)?;
    write_file(&out.join(ROOT_KEY_FILE), &ca.private_key()?, force, true)?;
    Ok(())
}

fn issue(root_dir: &Path, out: &Path, subject: &str, force: bool) -> Result<(), CliError> {
    let cert_path = root_dir.join(ROOT_CA_FILE);
    let key_path = root_dir.join(ROOT_KEY_FILE);
    let root_cert = fs::read(&cert_path).map_err(io_err(&cert_path))?;
    let root_key = zeroize::Zeroizing::new(fs::read(&key_path).map_err(io_err(&key_path))?);
    let mut ca = CertificateAuthority::from_parts(RustCryptoProvider, root_cert, &root_key)?;
    let device = ca.issue(subject)?;

    fs::create_dir_all(out).map_err(io_err(out))?;
    let paths = CredentialPaths::in_dir(out);
    write_file(&paths.root_ca, ca.certificate(), force, false)?;
    write_file(&paths.self_cert, &device.certificate, force, false)?;
    write_file(&paths.self_key, &device.private_key, force, true)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::InitRoot {
            out,
            subject,
            force,
        } => init_root(&out, &subject, force),
        Commands::Issue {
            root_dir,
            out,
            subject,
            force,
        } => issue(&root_dir, &out, &subject, force),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
