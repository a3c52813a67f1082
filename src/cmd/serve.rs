//! The `serve` subcommand, which is also what we run by default.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Args;

use crate::{
    prelude::*,
    recognizer::TesseractOptions,
    server::{AppState, run_server},
};

/// Port we listen on by default. Existing clients hard-code this.
pub const DEFAULT_PORT: u16 = 5000;

/// Address we listen on by default.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Options for the `serve` subcommand.
#[derive(Args, Clone, Debug)]
pub struct ServeOpts {
    /// Address to listen on.
    #[clap(long, default_value_t = DEFAULT_HOST)]
    pub host: IpAddr,

    /// Port to listen on.
    #[clap(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[clap(flatten)]
    pub engine: TesseractOptions,
}

impl Default for ServeOpts {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            engine: TesseractOptions::default(),
        }
    }
}

/// The `serve` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_serve(opts: &ServeOpts) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot get working directory")?;
    info!("OCR server running in directory: {}", cwd.display());

    // Load the engine before we accept any connections.
    let recognizer = super::load_recognizer(&opts.engine).await?;

    let addr = SocketAddr::new(opts.host, opts.port);
    run_server(addr, AppState::new(recognizer)).await
}
