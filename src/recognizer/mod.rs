//! Text recognition.
//!
//! An [`OcrEngine`] turns an image on disk into a list of text fragments in
//! reading order. A [`Recognizer`] wraps a single engine instance, built once
//! at startup, and flattens those fragments into the plain string we hand back
//! to callers.

use std::sync::Arc;

use thiserror::Error;

use crate::prelude::*;

pub mod tesseract;

pub use self::tesseract::{TesseractEngine, TesseractOptions};

/// Ways in which recognizing an image can fail.
///
/// Callers currently treat all of these the same way, but they are kept
/// distinct so they can be told apart.
#[derive(Debug, Error)]
pub enum RecognizeError {
    /// We could not launch the engine at all.
    #[error("cannot run {engine}: {source}")]
    Unavailable {
        engine: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran, but refused this input. The message is the engine's own
    /// description of what went wrong.
    #[error("{0}")]
    Rejected(String),
}

/// Interface to an OCR engine.
#[async_trait]
pub trait OcrEngine: Send + Sync + 'static {
    /// Read all the text in the image at `path`, as a list of fragments in
    /// reading order.
    async fn read_text(&self, path: &Path) -> Result<Vec<String>, RecognizeError>;
}

/// Shared handle to a preloaded [`OcrEngine`].
#[derive(Clone)]
pub struct Recognizer {
    engine: Arc<dyn OcrEngine>,
}

impl Recognizer {
    /// Wrap an already-initialized engine.
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    /// Recognize the text in the image at `path`.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn recognize(&self, path: &Path) -> Result<String, RecognizeError> {
        let fragments = self.engine.read_text(path).await?;
        trace!(?fragments, "Engine returned fragments");
        Ok(join_fragments(&fragments))
    }
}

/// Concatenate fragments, drop every space character, then trim.
///
/// Multi-word text such as "New York" comes out as "NewYork". Downstream
/// clients read short codes (captchas, signs) and depend on this.
pub fn join_fragments<S: AsRef<str>>(fragments: &[S]) -> String {
    let joined = fragments.iter().map(AsRef::as_ref).collect::<String>();
    joined.replace(' ', "").trim().to_owned()
}
