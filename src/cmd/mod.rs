//! Command-line entry points.

use std::sync::Arc;

use tokio::{fs::File, io::AsyncWrite};

use crate::{
    prelude::*,
    recognizer::{Recognizer, TesseractEngine, TesseractOptions},
};

pub mod ocr;
pub mod schema;
pub mod serve;

/// Load our OCR engine. This is slow, so do it once per process.
pub async fn load_recognizer(engine_opts: &TesseractOptions) -> Result<Recognizer> {
    let engine = TesseractEngine::new(engine_opts)
        .await
        .context("cannot initialize OCR engine")?;
    Ok(Recognizer::new(Arc::new(engine)))
}

/// Create a writer for `path`, or for standard output if no path is given.
async fn create_writer(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncWrite + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("Failed to create file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}
