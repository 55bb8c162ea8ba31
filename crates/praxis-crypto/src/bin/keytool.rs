//! praxis-keytool: Command-line tool for custody key operations.
//!
//! Covers the offline halves of the custody lifecycle: keypair generation
//! (random or PIN-derived), custody share splitting and reconstruction,
//! and envelope encryption for inspection and recovery work.

use clap::{Parser, Subcommand};
use praxis_crypto::{
    cipher, client_id, derive_kem_seed, kem::KeyPair, reconstruct, split, CustodyShare,
    WireEnvelope,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "praxis-keytool")]
#[command(author, version, about = "Custody key operations for praxis")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an ML-KEM-768 keypair
    Keygen {
        /// Derive deterministically from email + PIN + server share (hex);
        /// omit all three for a random keypair
        #[arg(long, requires_all = ["pin", "server_share"])]
        email: Option<String>,

        /// 6-digit PIN for deterministic derivation
        #[arg(long)]
        pin: Option<String>,

        /// Hex-encoded server share for deterministic derivation
        #[arg(long)]
        server_share: Option<String>,

        /// Output directory for key files (default: current directory)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Split a secret file into two custody shares
    Split {
        /// File containing the secret to split
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for share files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Reconstruct a secret from two custody share files
    Reconstruct {
        /// Share files (exactly two)
        #[arg(short, long, required = true, num_args = 2)]
        share: Vec<PathBuf>,

        /// Output file for the reconstructed secret
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Encrypt a file into a wire envelope (JSON)
    Encrypt {
        /// Input file to encrypt
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the envelope JSON
        #[arg(short, long)]
        output: PathBuf,

        /// Hex-encoded 32-byte key
        #[arg(short, long)]
        key: String,
    },

    /// Decrypt a wire envelope (JSON) back to plaintext
    Decrypt {
        /// Envelope JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for plaintext
        #[arg(short, long)]
        output: PathBuf,

        /// Hex-encoded 32-byte key
        #[arg(short, long)]
        key: String,
    },

    /// Print the non-secret client id for an email
    ClientId {
        /// Email address
        email: String,
    },
}

fn main() -> ExitCode {
    // Pick up PRAXIS_* overrides from a local .env if present.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Keygen {
            email,
            pin,
            server_share,
            output,
        } => {
            let keypair = match (email, pin, server_share) {
                (Some(email), Some(pin), Some(share)) => {
                    let seed = derive_kem_seed(&email, &pin, &share)?;
                    KeyPair::from_seed(&seed)
                }
                _ => KeyPair::generate(),
            };

            std::fs::write(
                output.join("public.key"),
                hex::encode(keypair.public.as_bytes()),
            )?;
            std::fs::write(
                output.join("private.key"),
                hex::encode(keypair.private.as_bytes()),
            )?;

            println!("Wrote public.key and private.key to {}", output.display());
            println!("Keep private.key out of any location the server can read.");
            Ok(())
        }

        Commands::Split { input, output } => {
            let secret = std::fs::read(&input)?;
            let shares = split(&secret, 2, 2)?;

            for share in &shares {
                let path = output.join(format!("share-{}.json", share.index));
                std::fs::write(&path, serde_json::to_string_pretty(share)?)?;
                println!("Wrote {}", path.display());
            }
            println!("Reconstruction requires BOTH shares; store them separately.");
            Ok(())
        }

        Commands::Reconstruct { share, output } => {
            let shares: Vec<CustodyShare> = share
                .iter()
                .map(|path| -> Result<CustodyShare, Box<dyn std::error::Error>> {
                    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
                })
                .collect::<Result<_, _>>()?;

            let secret = reconstruct(&shares)?;
            std::fs::write(&output, secret)?;
            println!("Reconstructed secret written to {}", output.display());
            Ok(())
        }

        Commands::Encrypt { input, output, key } => {
            let key = hex::decode(&key)?;
            let plaintext = std::fs::read(&input)?;

            let envelope = cipher::encrypt(&plaintext, &key)?;
            let wire = WireEnvelope::from(&envelope);
            std::fs::write(&output, serde_json::to_string_pretty(&wire)?)?;

            println!("Envelope written to {}", output.display());
            Ok(())
        }

        Commands::Decrypt { input, output, key } => {
            let key = hex::decode(&key)?;
            let wire: WireEnvelope = serde_json::from_str(&std::fs::read_to_string(&input)?)?;

            let plaintext = cipher::decrypt(&wire.decode()?, &key)?;
            std::fs::write(&output, plaintext)?;

            println!("Plaintext written to {}", output.display());
            Ok(())
        }

        Commands::ClientId { email } => {
            println!("{}", client_id(&email));
            Ok(())
        }
    }
}
