//! Text generation with credential rotation.
//!
//! [`GenerationClient`] owns the pool of provider credentials and walks it
//! when the provider reports quota exhaustion. The provider itself sits
//! behind [`TextGenerator`] so the rotation policy can be driven by fakes.

/// Gemini REST transport
pub mod gemini;

use crate::config::clean_keys;
use crate::error::{CriticError, Result};
use async_trait::async_trait;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub use gemini::GeminiGenerator;

/// Returned by the roast path when every credential hit its quota
pub const KEYS_EXHAUSTED_MESSAGE: &str =
    "Looks like every one of our API keys got roasted before your repo did. All quota is used up, try again later.";
/// Returned by the roast path for any other generation failure
pub const GENERATION_FAILED_MESSAGE: &str =
    "Our roaster choked on your repository. Something went wrong while generating the roast, try again.";

/// Sampling parameters sent with each generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling mass
    pub top_p: f32,
    /// Top-k cutoff
    pub top_k: u32,
    /// Output length cap; provider default when `None`
    pub max_output_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Loose, playful sampling for roasts
    pub fn roast() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: None,
        }
    }

    /// Conservative sampling with room for a full document
    pub fn readme() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: Some(8192),
        }
    }
}

/// A text-generation provider
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for `prompt` using `credential`.
    ///
    /// Provider throttling must surface as [`CriticError::QuotaExceeded`].
    async fn generate_text(&self, prompt: &str, options: &GenerationOptions, credential: &str) -> Result<String>;
}

/// Generation front-end with quota-driven key rotation.
///
/// The credential index only moves forward (modulo the pool size) and is
/// never reset. Concurrent rotations are last-writer-wins.
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
    credentials: Vec<String>,
    current: AtomicUsize,
}

impl GenerationClient {
    /// Creates a client over a non-empty credential pool.
    ///
    /// Blank and duplicate credentials are dropped before the pool is checked.
    pub fn new(generator: Arc<dyn TextGenerator>, credentials: Vec<String>) -> Result<Self> {
        let credentials = clean_keys(credentials);
        if credentials.is_empty() {
            return Err(CriticError::Config("No generation API keys configured".to_string()));
        }
        info!("Generation client initialized with {} API key(s)", credentials.len());
        Ok(Self {
            generator,
            credentials,
            current: AtomicUsize::new(0),
        })
    }

    /// Number of credentials in the pool
    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Index of the credential the next call starts with
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Advances to the next credential, wrapping, and returns it
    pub fn rotate_key(&self) -> &str {
        let len = self.credentials.len();
        let previous = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        let next = (previous + 1) % len;
        info!("Rotated to API key {}/{}", next + 1, len);
        &self.credentials[next]
    }

    /// Generates text, rotating credentials on quota errors.
    ///
    /// Makes at most one attempt per credential. Non-quota errors are
    /// returned immediately.
    pub async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let attempts = self.credentials.len();
        for attempt in 1..=attempts {
            let index = self.current_index() % attempts;
            let credential = &self.credentials[index];

            match self.generator.generate_text(prompt, options, credential).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_quota_exceeded() => {
                    warn!("API key {}/{} hit its quota: {}", index + 1, attempts, e);
                    if attempt < attempts {
                        self.rotate_key();
                    }
                }
                Err(e) => return Err(e),
            }
        }
        error!("All {} API keys exhausted", attempts);
        Err(CriticError::KeysExhausted { attempts })
    }

    /// Like [`generate`](Self::generate) but never fails; errors become a
    /// fixed user-facing message.
    pub async fn generate_or_apologize(&self, prompt: &str, options: &GenerationOptions) -> String {
        match self.generate(prompt, options).await {
            Ok(text) => text,
            Err(CriticError::KeysExhausted { .. }) => KEYS_EXHAUSTED_MESSAGE.to_string(),
            Err(e) => {
                error!("Generation failed: {}", e);
                GENERATION_FAILED_MESSAGE.to_string()
            }
        }
    }
}
