use std::error::Error;
use std::io::Write;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thin_transit::{ClientOptions, TransitClient, TransitEncrypts};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thin-transit", version)]
#[command(about = "Encrypt and decrypt through a transit engine", long_about = None)]
struct Cli {
    /// Server url, e.g. http://192.168.20.20:8200
    #[arg(long, env = "VAULT_ADDR")]
    addr: String,

    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a plaintext and print the ciphertext token
    Encrypt {
        key: String,
        plaintext: String,
        #[arg(long)]
        context: Option<String>,
    },
    /// Decrypt a ciphertext token and write the plaintext to stdout
    Decrypt {
        key: String,
        ciphertext: String,
        #[arg(long)]
        context: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = TransitClient::with_options(
        &cli.addr,
        cli.token,
        ClientOptions::default().with_timeout(Duration::from_secs(cli.timeout_secs)),
    )?;

    match cli.command {
        Commands::Encrypt {
            key,
            plaintext,
            context,
        } => {
            let ciphertext = client
                .encrypt(&key, plaintext.as_bytes(), context.as_deref().map(str::as_bytes))
                .await?;
            println!("{}", ciphertext);
        }
        Commands::Decrypt {
            key,
            ciphertext,
            context,
        } => {
            let plaintext = client
                .decrypt(&key, &ciphertext, context.as_deref().map(str::as_bytes))
                .await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
