//! totp - TOTP codes from an encrypted local vault
//!
//! Commands:
//! - add <NAME> [SECRET]: Store a secret (prompts if no value)
//! - list: List stored secret names
//! - get <NAME>: Print the current code for a stored secret
//! - remove <NAME>: Delete a stored secret
//! - generate <SECRET>: Print the current code for a raw secret
//! - verify <NAME> <CODE>: Check a code against a stored secret

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use totp::{otp, OtpGenerator, SecretVault};
use totp_core::{Config, Paths};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "totp")]
#[command(about = "CLI tool for generating TOTP (Time-based One-Time Password) codes")]
#[command(version)]
#[command(after_help = r#"STORAGE:
    - Secrets are encrypted with AES-256-GCM before they touch disk
    - Vault stored in ~/.config/totp-cli/secrets.json
    - Key stored in ~/.config/totp-cli/key.bin (mode 0600)
    - Override the location with --home or TOTP_CLI_HOME
    - Losing key.bin makes every stored secret unreadable"#)]
struct Cli {
    /// Vault directory (defaults to $TOTP_CLI_HOME or ~/.config/totp-cli)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new TOTP secret with a name (prompts securely if secret not provided)
    Add {
        /// Name to store the secret under (e.g., github)
        name: String,
        /// Base32 secret (omit for secure hidden prompt)
        secret: Option<String>,
        /// Optional issuer name
        #[arg(short, long)]
        issuer: Option<String>,
    },

    /// List all stored TOTP secrets (values hidden)
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate the TOTP code for a stored secret
    Get {
        /// Print only the code (useful for piping)
        #[arg(short = 'q', long)]
        quiet: bool,
        /// Secret name
        name: String,
    },

    /// Remove a stored TOTP secret
    Remove {
        /// Secret name to remove
        name: String,
    },

    /// Generate a TOTP code from a raw secret
    Generate {
        /// Base32 secret
        secret: String,
    },

    /// Verify a code against a stored secret
    Verify {
        /// Secret name
        name: String,
        /// Code to check
        code: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = match &cli.home {
        Some(home) => Paths::at(home),
        None => Paths::new(),
    };
    let config = Config::load(&paths.config_file())?;
    let vault = SecretVault::open(&paths, &config);

    match cli.command {
        Some(Commands::Add {
            name,
            secret,
            issuer,
        }) => cmd_add(&vault, &name, secret, issuer.as_deref()),
        Some(Commands::List { json }) => cmd_list(&vault, json),
        Some(Commands::Get { quiet, name }) => cmd_get(&vault, &name, quiet),
        Some(Commands::Remove { name }) => cmd_remove(&vault, &name),
        Some(Commands::Generate { secret }) => cmd_generate(&secret),
        Some(Commands::Verify { name, code }) => cmd_verify(&vault, &name, &code),
        None => {
            // Default to listing secrets
            cmd_list(&vault, false)
        }
    }
}

/// Store a secret
fn cmd_add(
    vault: &SecretVault,
    name: &str,
    secret: Option<String>,
    issuer: Option<&str>,
) -> Result<()> {
    // Get value - prompt if not provided
    let secret = match secret {
        Some(s) => s,
        None => {
            let entered = rpassword::prompt_password("Enter TOTP secret: ")
                .context("Failed to read secret value")?;

            if entered.is_empty() {
                bail!("Empty secret not allowed");
            }

            entered
        }
    };

    // Refuse secrets that could never produce a code
    OtpGenerator::new(&secret, Default::default())
        .with_context(|| format!("Cannot store TOTP secret for {}", name))?;

    vault
        .store(name, &secret, issuer)
        .context("Error storing TOTP secret")?;

    println!("Successfully added TOTP secret for: {}", name);

    Ok(())
}

/// List all secrets
fn cmd_list(vault: &SecretVault, json: bool) -> Result<()> {
    let secrets = vault.list().context("Error listing TOTP secrets")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&secrets)?);
        return Ok(());
    }

    if secrets.is_empty() {
        println!("No TOTP secrets found.");
        return Ok(());
    }

    println!("Stored TOTP secrets:");
    for (index, entry) in secrets.iter().enumerate() {
        match &entry.issuer {
            Some(issuer) => println!("{}. {} ({})", index + 1, entry.name, issuer),
            None => println!("{}. {}", index + 1, entry.name),
        }
    }

    Ok(())
}

/// Print the current code for a stored secret
fn cmd_get(vault: &SecretVault, name: &str, quiet: bool) -> Result<()> {
    let generator = stored_generator(vault, name)?;
    let code = generator.generate();

    if quiet {
        println!("{}", code);
    } else {
        println!("TOTP Code for {}: {}", name, code);
        println!("Time remaining: {}s", otp::time_remaining());
    }

    Ok(())
}

/// Delete a secret
fn cmd_remove(vault: &SecretVault, name: &str) -> Result<()> {
    let removed = vault.remove(name).context("Error removing TOTP secret")?;

    if !removed {
        bail!("TOTP secret not found: {}", name);
    }

    println!("Successfully removed TOTP secret: {}", name);
    Ok(())
}

/// Print the current code for a raw secret
fn cmd_generate(secret: &str) -> Result<()> {
    let code = otp::generate(secret).context("Error generating TOTP")?;

    println!("TOTP Code: {}", code);
    println!("Time remaining: {}s", otp::time_remaining());

    Ok(())
}

/// Check a code against a stored secret
fn cmd_verify(vault: &SecretVault, name: &str, code: &str) -> Result<()> {
    let generator = stored_generator(vault, name)?;

    if !generator.verify(code) {
        bail!("Invalid code for {}", name);
    }

    println!("Valid code for {}", name);
    Ok(())
}

fn stored_generator(vault: &SecretVault, name: &str) -> Result<OtpGenerator> {
    let Some(record) = vault.record(name)? else {
        bail!("TOTP secret not found: {}", name);
    };
    let Some(secret) = vault
        .fetch(name)
        .with_context(|| format!("Cannot read TOTP secret for {}", name))?
    else {
        bail!("TOTP secret not found: {}", name);
    };

    OtpGenerator::new(&secret, record.algorithm)
        .with_context(|| format!("Stored secret for {} is unusable", name))
}
