//! The `ocr` subcommand, for recognizing a single image without a server.

use clap::Args;
use tokio::{fs, io::AsyncWriteExt as _};

use crate::{
    prelude::*,
    recognizer::{Recognizer, TesseractOptions},
    server::api::RecognizeResponse,
    ui::{ProgressConfig, Ui},
};

/// Options for the `ocr` subcommand.
#[derive(Args, Clone, Debug)]
pub struct OcrOpts {
    /// The image to OCR.
    pub image_path: PathBuf,

    /// Where to write the JSON result. Defaults to standard output.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,

    #[clap(flatten)]
    pub engine: TesseractOptions,
}

/// The `ocr` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_ocr(ui: Ui, opts: &OcrOpts) -> Result<()> {
    // Check this before paying to load the engine.
    ensure_image_exists(&opts.image_path).await?;
    let recognizer = super::load_recognizer(&opts.engine).await?;
    ocr_to_output(
        &ui,
        &recognizer,
        &opts.image_path,
        opts.output_path.as_deref(),
    )
    .await
}

/// Fail unless something exists at `image_path`.
async fn ensure_image_exists(image_path: &Path) -> Result<()> {
    if fs::try_exists(image_path).await.unwrap_or(false) {
        Ok(())
    } else {
        Err(anyhow!("Image file not found at: {}", image_path.display()))
    }
}

/// Recognize `image_path` and write the result as JSON.
async fn ocr_to_output(
    ui: &Ui,
    recognizer: &Recognizer,
    image_path: &Path,
    output_path: Option<&Path>,
) -> Result<()> {
    let sp = ui.new_spinner(&ProgressConfig {
        emoji: "🔎",
        msg: "Recognizing text",
        done_msg: "Recognized text",
    });
    let text = recognizer
        .recognize(image_path)
        .await
        .with_context(|| format!("Error processing image: {}", image_path.display()))?;
    sp.finish_using_style();
    info!(text = %text, "Extracted text");

    let mut json = serde_json::to_string(&RecognizeResponse { text })
        .context("failed to serialize result")?;
    json.push('\n');
    let mut wtr = super::create_writer(output_path).await?;
    wtr.write_all(json.as_bytes())
        .await
        .context("failed to write result")?;
    wtr.flush().await.context("failed to flush result")?;
    Ok(())
}
