use std::fmt;

/// Sizes before and after encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressionStats {
    pub fn new(original_size: usize, compressed_size: usize) -> Self {
        CompressionStats {
            original_size,
            compressed_size,
        }
    }

    /// Original size divided by compressed size. Two empty buffers compare as 1.0
    pub fn ratio(&self) -> f64 {
        match (self.original_size, self.compressed_size) {
            (0, 0) => 1.0,
            (_, 0) => f64::INFINITY,
            (orig, comp) => orig as f64 / comp as f64,
        }
    }

    /// True when the encoded form is strictly smaller (ratio above 1)
    pub fn is_improvement(&self) -> bool {
        self.compressed_size < self.original_size
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Original Size: {} bytes", self.original_size)?;
        writeln!(f, "Compressed Size: {} bytes", self.compressed_size)?;
        write!(f, "Compression Ratio: {:.2}", self.ratio())
    }
}
