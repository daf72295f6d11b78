//! Text embeddings for the neighbor grapher.

use crate::error::EmbedError;
use tracing::debug;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector, and every vector has [`Embedder::dimensions`] entries.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    fn dimensions(&self) -> usize;
}

/// Feature-hashing bag-of-identifiers embedder.
///
/// Splits text into identifier tokens (splitting `snake_case` and
/// `camelCase` too), hashes each into a bucket with a sign, and
/// L2-normalizes the result. Runs offline and needs no model files;
/// text without tokens embeds as the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, EmbedError> {
        if dimensions == 0 {
            return Err(EmbedError::InvalidDimensions(dimensions));
        }
        Ok(Self { dimensions })
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embeds every `(file_name, content)` pair, keeping input order.
pub fn embed_files<'a>(
    files: impl IntoIterator<Item = (&'a str, &'a str)>,
    embedder: &dyn Embedder,
) -> Result<Vec<(String, Vec<f32>)>, EmbedError> {
    let mut embeddings = Vec::new();
    for (name, content) in files {
        embeddings.push((name.to_string(), embedder.embed(content)?));
    }
    debug!(
        "Embedded {} files into {} dimensions",
        embeddings.len(),
        embedder.dimensions()
    );
    Ok(embeddings)
}

/// Lowercased identifier tokens, with compound identifiers also split
/// into their parts.
fn tokens(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
    {
        let lower = word.to_lowercase();
        let parts = split_identifier(word);
        if parts.len() > 1 {
            out.extend(parts);
        }
        out.push(lower);
    }
    out
}

fn split_identifier(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in word.chars() {
        if c == '_' {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
