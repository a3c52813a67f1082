//! OCR engine wrapping the `tesseract` CLI tool.

use std::ffi::OsString;

use clap::Args;
use tokio::process::Command;

use crate::{async_utils::check_for_command_failure, prelude::*};

use super::{OcrEngine, RecognizeError};

/// The recognition locale we use unless told otherwise.
pub const DEFAULT_LANG: &str = "eng";

/// Options for constructing a [`TesseractEngine`].
#[derive(Args, Clone, Debug)]
pub struct TesseractOptions {
    /// Language model to recognize with. Use `+` to combine models, as in
    /// `eng+fra`.
    #[clap(long, default_value = DEFAULT_LANG)]
    pub lang: String,

    /// The `tesseract` executable to run.
    #[clap(long, default_value = "tesseract")]
    pub tesseract_bin: PathBuf,

    /// Page segmentation mode, passed to `tesseract --psm` unchanged.
    #[clap(long)]
    pub psm: Option<u8>,

    /// Only recognize these characters, as in
    /// `ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789` for
    /// alphanumeric captchas. Passed as `-c tessedit_char_whitelist=...`.
    #[clap(long)]
    pub char_whitelist: Option<String>,
}

impl Default for TesseractOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_owned(),
            tesseract_bin: PathBuf::from("tesseract"),
            psm: None,
            char_whitelist: None,
        }
    }
}

/// OCR engine wrapping the `tesseract` CLI tool.
#[derive(Debug)]
pub struct TesseractEngine {
    opts: TesseractOptions,
}

impl TesseractEngine {
    /// Check that `tesseract` runs and has our language model installed.
    ///
    /// Call this once at startup, so that a missing model is reported before
    /// we accept any work.
    #[instrument(level = "debug", skip_all, fields(lang = %opts.lang))]
    pub async fn new(opts: &TesseractOptions) -> Result<Self> {
        let output = Command::new(&opts.tesseract_bin)
            .arg("--list-langs")
            .output()
            .await
            .with_context(|| format!("cannot run {}", opts.tesseract_bin.display()))?;
        check_for_command_failure("tesseract", &output)?;

        // Older releases print the list to stderr.
        let listing = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        let installed = parse_lang_list(&listing);
        for lang in opts.lang.split('+') {
            if !installed.iter().any(|l| l == lang) {
                return Err(anyhow!(
                    "tesseract language model {:?} is not installed (available: {})",
                    lang,
                    installed.join(", "),
                ));
            }
        }

        info!(lang = %opts.lang, "Tesseract engine ready");
        Ok(Self { opts: opts.clone() })
    }

    /// Arguments for recognizing `path`, with the text written to stdout.
    fn recognize_args(&self, path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            path.into(),
            "stdout".into(),
            "-l".into(),
            self.opts.lang.clone().into(),
        ];
        if let Some(psm) = self.opts.psm {
            args.push("--psm".into());
            args.push(psm.to_string().into());
        }
        if let Some(whitelist) = &self.opts.char_whitelist {
            args.push("-c".into());
            args.push(format!("tessedit_char_whitelist={whitelist}").into());
        }
        args
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    async fn read_text(&self, path: &Path) -> Result<Vec<String>, RecognizeError> {
        let output = Command::new(&self.opts.tesseract_bin)
            .args(self.recognize_args(path))
            .output()
            .await
            .map_err(|source| RecognizeError::Unavailable {
                engine: self.opts.tesseract_bin.display().to_string(),
                source,
            })?;
        // Leptonica prints "Error in ..." lines for problems tesseract
        // recovers from, so only the exit status means failure.
        check_for_command_failure("tesseract", &output)
            .map_err(|err| RecognizeError::Rejected(err.to_string()))?;

        Ok(split_fragments(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse the output of `tesseract --list-langs`.
fn parse_lang_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available"))
        .map(str::to_owned)
        .collect()
}

/// Split `tesseract` text output into one fragment per non-blank line.
///
/// This also drops the form feed that `tesseract` writes after each page.
fn split_fragments(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::recognizer::Recognizer;

    #[test]
    fn parses_lang_list() {
        let listing = "List of available languages in \"/usr/share/tesseract-ocr/5/tessdata/\" (3):\neng\nosd\nfra\n";
        assert_eq!(parse_lang_list(listing), vec!["eng", "osd", "fra"]);
    }

    #[test]
    fn splits_page_output_into_fragments() {
        let text = "Hello\n\nWorld 2024 \n\x0c";
        assert_eq!(split_fragments(text), vec!["Hello", "World 2024"]);
        assert!(split_fragments("\n\x0c").is_empty());
    }

    /// An engine running `tesseract_bin` with otherwise default options.
    fn engine_with_bin(tesseract_bin: PathBuf) -> TesseractEngine {
        TesseractEngine {
            opts: TesseractOptions {
                tesseract_bin,
                ..TesseractOptions::default()
            },
        }
    }

    /// Write an executable shell script that stands in for `tesseract`.
    #[cfg(unix)]
    fn fake_tesseract(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt as _;

        let path = dir.join("tesseract");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn default_args_read_to_stdout_in_english() {
        let engine = engine_with_bin(PathBuf::from("tesseract"));
        assert_eq!(
            engine.recognize_args(Path::new("/tmp/sign.png")),
            os_args(&["/tmp/sign.png", "stdout", "-l", "eng"]),
        );
    }

    #[test]
    fn captcha_args_include_psm_and_whitelist() {
        let engine = TesseractEngine {
            opts: TesseractOptions {
                psm: Some(7),
                char_whitelist: Some("ABC123".to_owned()),
                ..TesseractOptions::default()
            },
        };
        assert_eq!(
            engine.recognize_args(Path::new("captcha.png")),
            os_args(&[
                "captcha.png",
                "stdout",
                "-l",
                "eng",
                "--psm",
                "7",
                "-c",
                "tessedit_char_whitelist=ABC123",
            ]),
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn recovered_errors_on_stderr_do_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_tesseract(
            dir.path(),
            "echo STOP\n\
             echo 'Error in boxClipToRectangle: box outside rectangle' >&2\n\
             echo 'Error in pixScanForForeground: invalid box' >&2\n\
             exit 0",
        );
        let recognizer = Recognizer::new(std::sync::Arc::new(engine_with_bin(bin)));
        let text = recognizer.recognize(Path::new("sign.png")).await.unwrap();
        assert_eq!(text, "STOP");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_exit_status_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_tesseract(
            dir.path(),
            "echo 'Error in pixReadStream: Unknown format: no pix returned' >&2\n\
             exit 1",
        );
        let engine = engine_with_bin(bin);
        let err = engine.read_text(Path::new("bad.png")).await.unwrap_err();
        assert!(matches!(err, RecognizeError::Rejected(_)), "{err:?}");
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"), "{msg}");
        assert!(msg.contains("no pix returned"), "{msg}");
    }

    #[tokio::test]
    async fn missing_binary_fails_at_startup() {
        let opts = TesseractOptions {
            tesseract_bin: PathBuf::from("/nonexistent/bin/tesseract"),
            ..TesseractOptions::default()
        };
        let err = TesseractEngine::new(&opts).await.unwrap_err();
        assert!(err.to_string().contains("cannot run"));
    }

    #[tokio::test]
    async fn missing_binary_is_reported_as_unavailable() {
        let engine = engine_with_bin(PathBuf::from("/nonexistent/bin/tesseract"));
        let err = engine.read_text(Path::new("x.png")).await.unwrap_err();
        assert!(matches!(err, RecognizeError::Unavailable { .. }));
    }

    #[tokio::test]
    #[ignore = "Needs tesseract installed"]
    async fn unknown_language_fails_at_startup() {
        let opts = TesseractOptions {
            lang: "xx-not-a-language".to_owned(),
            ..TesseractOptions::default()
        };
        let err = TesseractEngine::new(&opts).await.unwrap_err();
        assert!(err.to_string().contains("is not installed"));
    }

    #[tokio::test]
    #[ignore = "Needs tesseract installed"]
    async fn reads_stop_sign() {
        let engine = TesseractEngine::new(&TesseractOptions::default())
            .await
            .unwrap();
        let recognizer = Recognizer::new(std::sync::Arc::new(engine));
        let text = recognizer
            .recognize(Path::new("tests/fixtures/images/stop.png"))
            .await
            .unwrap();
        assert_eq!(text, "STOP");
    }

    #[tokio::test]
    #[ignore = "Needs tesseract installed"]
    async fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        fs::write(&path, b"").unwrap();

        let engine = TesseractEngine::new(&TesseractOptions::default())
            .await
            .unwrap();
        let recognizer = Recognizer::new(std::sync::Arc::new(engine));
        let err = recognizer.recognize(&path).await.unwrap_err();
        assert!(matches!(err, RecognizeError::Rejected(_)), "{err:?}");
        assert!(err.to_string().contains("tesseract"));
    }
}
