use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use sealpost::config::{
    ClientConfig, DEFAULT_HOST, DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, PASSWORD_ENV, PASSWORD_MIN_LENGTH, ServerConfig,
};
use sealpost::secret::Secret;
use sealpost::transport::{Client, Server};
use sealpost::ui::display;
use sealpost::ui::prompt::Prompt;

#[derive(Subcommand)]
pub enum Commands {
    /// Receive files into a directory.
    Serve {
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
        max_connections: usize,

        /// Seconds to wait for a complete request.
        #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT.as_secs())]
        read_timeout: u64,

        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Send one file to a server.
    Send {
        file: PathBuf,

        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Parser)]
#[command(name = "sealpost", version = "26.1.0", about = "Send a file over TCP, sealed with a shared password (PBKDF2 + XChaCha20-Poly1305).")]
pub struct App {
    /// Log handler stages and protocol detail.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();
        let level = if app.verbose { Level::DEBUG } else { Level::INFO };

        let subscriber = tracing_subscriber::fmt().with_max_level(level).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        let prompt = Prompt::new(PASSWORD_MIN_LENGTH);
        match self.command {
            Commands::Serve { host, port, output_dir, max_connections, read_timeout, password } => {
                let password = match password {
                    Some(password) => Secret::from_string(password),
                    None => prompt.server_password()?,
                };
                let config = ServerConfig::new(host, port, password, output_dir)?
                    .with_max_connections(max_connections)
                    .with_read_timeout(Duration::from_secs(read_timeout));

                Self::serve(config).await
            }
            Commands::Send { file, host, port, password } => {
                let password = match password {
                    Some(password) => Secret::from_string(password),
                    None => prompt.client_password()?,
                };

                Self::send(ClientConfig::new(host, port, password)?, file).await
            }
        }
    }

    async fn serve(config: ServerConfig) -> Result<()> {
        let output_dir = config.output_dir().to_path_buf();
        let server = Server::bind(config).await?;

        display::show_listening(server.local_addr()?, &output_dir);

        server
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
            })
            .await?;

        display::show_stopped();
        Ok(())
    }

    async fn send(config: ClientConfig, file: PathBuf) -> Result<()> {
        let client = Client::new(config);

        match client.send_file(&file).await {
            Ok(receipt) => {
                display::show_delivered(&file, &receipt);
                Ok(())
            }
            Err(err) => {
                display::show_failed(&file, &err);
                Err(err).with_context(|| format!("transfer failed: {}", file.display()))
            }
        }
    }
}
