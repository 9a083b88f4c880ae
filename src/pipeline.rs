use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::files;
use crate::rle::{self, CodecError, RleConfig};
use crate::stats::CompressionStats;

/// Everything the compress pipeline needs to know
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: RleConfig,
    /// Strip leading and trailing whitespace before encoding
    pub trim: bool,
}

/// Outcome of one compress run
#[derive(Debug)]
pub struct CompressReport {
    pub original: Vec<u8>,
    pub encoded: Vec<u8>,
    pub decoded: Vec<u8>,
    pub stats: CompressionStats,
    /// Set when the encoded form was written out
    pub saved_to: Option<PathBuf>,
}

impl CompressReport {
    pub fn verified(&self) -> bool {
        self.original == self.decoded
    }
}

/// Reads, encodes, saves (when smaller) and decodes again to verify.
///
/// # Errors
/// Fails if the input cannot be read, contains the sentinel byte, the output
/// cannot be written, or the encoded form does not decode
pub fn compress_file(opts: &CompressOptions) -> Result<CompressReport> {
    let raw = files::read(&opts.input)
        .with_context(|| format!("Failed to read input file: {}", opts.input.display()))?;
    debug!("read {} bytes from {}", raw.len(), opts.input.display());

    let original = if opts.trim {
        trim_whitespace(&raw).to_vec()
    } else {
        raw
    };

    if let Some(offset) = rle::find_sentinel(&original) {
        return Err(CodecError::SentinelInInput { offset })
            .with_context(|| format!("Cannot encode {}", opts.input.display()));
    }

    let encoded = rle::encode(&original, &opts.config);
    let stats = CompressionStats::new(original.len(), encoded.len());
    info!(
        "encoded {} -> {} bytes (triggers {:?}, threshold {})",
        stats.original_size,
        stats.compressed_size,
        opts.config.triggers(),
        opts.config.threshold()
    );

    let saved_to = if stats.is_improvement() {
        files::write(&opts.output, &encoded).with_context(|| {
            format!("Failed to write compressed file: {}", opts.output.display())
        })?;
        Some(opts.output.clone())
    } else {
        debug!("ratio {:.2} is not better than 1, skipping write", stats.ratio());
        None
    };

    let decoded = rle::decode(&encoded).context("Failed to decode freshly encoded data")?;

    Ok(CompressReport {
        original,
        encoded,
        decoded,
        stats,
        saved_to,
    })
}

/// Decodes `input` into `output`, returning the decoded size
pub fn decompress_file(input: &Path, output: &Path) -> Result<usize> {
    let encoded = files::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let decoded = rle::decode(&encoded)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    files::write(output, &decoded)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;
    info!(
        "decoded {} -> {} bytes into {}",
        encoded.len(),
        decoded.len(),
        output.display()
    );
    Ok(decoded.len())
}

// Unicode whitespace for UTF-8 text, ASCII whitespace plus vertical tab otherwise
fn trim_whitespace(data: &[u8]) -> &[u8] {
    if let Ok(text) = std::str::from_utf8(data) {
        return text.trim().as_bytes();
    }

    let is_space = |b: &u8| b.is_ascii_whitespace() || *b == 0x0B;
    let start = data.iter().position(|b| !is_space(b)).unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !is_space(b))
        .map_or(start, |i| i + 1);
    &data[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn setup(contents: &[u8]) -> (TempDir, CompressOptions) {
        let dir = tempdir().unwrap();
        let input = dir.path().join("data.txt");
        fs::write(&input, contents).unwrap();
        let opts = CompressOptions {
            input,
            output: dir.path().join("compressed.txt"),
            config: RleConfig::default(),
            trim: true,
        };
        (dir, opts)
    }

    #[test]
    fn test_compressible_input_is_saved() -> Result<()> {
        let (_dir, opts) = setup(b"abffffffffff0000000000\n");
        let report = compress_file(&opts)?;

        assert_eq!(report.original, b"abffffffffff0000000000");
        assert_eq!(report.encoded, b"ab|f10||010|");
        assert_eq!(report.stats, CompressionStats::new(22, 12));
        assert_eq!(report.saved_to.as_deref(), Some(opts.output.as_path()));
        assert_eq!(fs::read(&opts.output)?, b"ab|f10||010|");
        assert!(report.verified());
        Ok(())
    }

    #[test]
    fn test_incompressible_input_not_saved() -> Result<()> {
        let (_dir, opts) = setup(b"abc");
        let report = compress_file(&opts)?;

        assert_eq!(report.encoded, b"abc");
        assert!(report.saved_to.is_none());
        assert!(!opts.output.exists());
        assert!(report.verified());
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        let (_dir, opts) = setup(b"  \n");
        let report = compress_file(&opts)?;

        assert!(report.original.is_empty());
        assert!(report.encoded.is_empty());
        assert!(report.saved_to.is_none());
        assert!(report.verified());
        Ok(())
    }

    #[test]
    fn test_no_trim_keeps_whitespace() -> Result<()> {
        let (_dir, mut opts) = setup(b" ffffff\n");
        opts.trim = false;
        let report = compress_file(&opts)?;
        assert_eq!(report.encoded, b" |f6|\n");
        Ok(())
    }

    #[test]
    fn test_sentinel_input_rejected() {
        let (_dir, opts) = setup(b"a|b");
        let err = compress_file(&opts).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::SentinelInInput { offset: 1 })
        );
        assert!(!opts.output.exists());
    }

    #[test]
    fn test_missing_input_mentions_path() {
        let (dir, mut opts) = setup(b"");
        opts.input = dir.path().join("missing.txt");
        let err = compress_file(&opts).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.txt"));
    }

    #[test]
    fn test_decompress_file() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("compressed.txt");
        let output = dir.path().join("restored.txt");
        fs::write(&input, b"x|f6|y")?;

        assert_eq!(decompress_file(&input, &output)?, 8);
        assert_eq!(fs::read(&output)?, b"xffffffy");
        Ok(())
    }

    #[test]
    fn test_decompress_malformed() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("compressed.txt");
        fs::write(&input, b"x|f6")?;

        let err = decompress_file(&input, &dir.path().join("out.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::MalformedEncoding { offset: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_trim_whitespace() {
        assert_eq!(trim_whitespace(b"  ab c\t\n"), b"ab c");
        assert_eq!(trim_whitespace(b" \n "), b"");
        assert_eq!(trim_whitespace(b""), b"");
    }

    #[test]
    fn test_trim_vertical_tab_and_unicode_spaces() {
        assert_eq!(trim_whitespace(b"\x0bff\x0b"), b"ff");
        // NBSP and NEL around UTF-8 text
        assert_eq!(trim_whitespace("\u{a0}ab\u{85}".as_bytes()), b"ab");
        // Invalid UTF-8 still loses its ASCII whitespace and vertical tabs
        assert_eq!(trim_whitespace(b"\x0b \xffab\n"), b"\xffab");
    }
}
