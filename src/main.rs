use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{cmd::serve::ServeOpts, prelude::*, ui::Ui};

mod async_utils;
mod cmd;
mod prelude;
mod recognizer;
mod server;
mod ui;

/// OCR images on local disk over HTTP.
///
/// With no subcommand, this runs `serve` with default options.
#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    after_help = r#"
HTTP API:
  POST /ocr  {"image_path": "<path>"}  ->  {"text": "<recognized text>"}

Environment Variables:
  - RUST_LOG (optional): Log filter, such as `debug` or `ocr_server=trace`.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    #[clap(subcommand)]
    subcmd: Option<Cmd>,
}

/// The subcommands we support.
#[derive(Debug, Subcommand)]
enum Cmd {
    /// Serve `POST /ocr` over HTTP.
    Serve(cmd::serve::ServeOpts),
    /// OCR a single image and print the result as JSON.
    Ocr(cmd::ocr::OcrOpts),
    /// Print schemas for request and response bodies.
    Schema(cmd::schema::SchemaOpts),
}

impl Cmd {
    /// Are we using stdout for output?
    fn using_stdout_for_output(&self) -> bool {
        match self {
            Cmd::Serve(_) => false,
            Cmd::Ocr(opts) => opts.output_path.is_none(),
            Cmd::Schema(opts) => opts.output_path.is_none(),
        }
    }
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    let ui = Ui::init();

    // Load environment variables from a `.env` file, if it exists. Do this
    // first, so that it can set `RUST_LOG`.
    dotenvy::dotenv().ok();

    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(ui.get_stderr_writer())
        .with_filter(env_filter);

    tracing_subscriber::registry().with(subscriber).init();

    // Call our real `main` function now that logging is set up.
    real_main(ui).await
}

/// Our real entry point.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main(ui: Ui) -> Result<()> {
    // Parse command-line arguments.
    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    // Hide the spinner if we're using stdout for output.
    if opts.subcmd.as_ref().is_some_and(Cmd::using_stdout_for_output) {
        ui.hide_progress_bars();
    }

    // Run the appropriate subcommand.
    match &opts.subcmd {
        None => {
            cmd::serve::cmd_serve(&ServeOpts::default()).await?;
        }
        Some(Cmd::Serve(serve_opts)) => {
            cmd::serve::cmd_serve(serve_opts).await?;
        }
        Some(Cmd::Ocr(ocr_opts)) => {
            cmd::ocr::cmd_ocr(ui, ocr_opts).await?;
        }
        Some(Cmd::Schema(schema_opts)) => {
            cmd::schema::cmd_schema(schema_opts).await?;
        }
    }
    Ok(())
}
