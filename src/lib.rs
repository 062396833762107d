//! Wireframer
//!
//! Turns a live web page into a high-fidelity HTML/CSS wireframe: the page is
//! rendered, its visual and structural characteristics are extracted into a
//! bounded [`WebsiteSnapshot`], compiled into a constrained generation prompt
//! plus a set of CSS style variables, sent to a text generation service, and
//! the returned markup is reconciled against the extracted values.
//!
//! # Features
//!
//! - **CDP Backend** (default): renders through headless Chrome
//! - **Static Backend**: plain HTTP fetch + HTML parse, no JavaScript
//! - **Swappable collaborators**: rendering, generation, accessibility and
//!   image rewriting all sit behind traits
//!
//! # Example
//!
//! ```no_run
//! use wireframer::{Pipeline, WireframeConfig, WireframeRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WireframeConfig::from_env()?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let response = pipeline.run(&WireframeRequest::new("https://example.com"))?;
//! println!("{}", response.html);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod api;
pub mod backend;
pub mod collaborators;
pub mod dom;
pub mod generation;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub(crate) mod sampler;
pub mod server;
pub mod snapshot;
pub mod static_page;
pub mod style_vars;

#[cfg(feature = "cdp")]
pub mod cdp;

// Async-friendly facade (worker thread + oneshot replies)
pub mod async_api;

pub use api::{WireframeRequest, WireframeResponse};
pub use async_api::AsyncPipeline;
pub use backend::{PageSession, RenderingBackend, SessionGuard};
pub use generation::{GenerationConfig, GenerationService};
pub use pipeline::{Pipeline, StageOutcome};
pub use reconcile::{GenericValueCatalogue, Reconciler};
pub use snapshot::WebsiteSnapshot;
pub use style_vars::StyleVariableSet;

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
        }
    }
}

impl std::str::FromStr for Viewport {
    type Err = Error;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x720`.
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| Error::ConfigError(format!("Viewport must look like 1280x720, got '{}'", s)))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| Error::ConfigError(format!("Bad viewport dimension '{}': {}", v, e)))
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

/// Which rendering backend [`default_backend`] builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// CDP when compiled in, static otherwise
    #[default]
    Auto,
    Cdp,
    Static,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "cdp" | "chrome" => Ok(BackendKind::Cdp),
            "static" | "http" => Ok(BackendKind::Static),
            other => Err(Error::ConfigError(format!("Unknown backend '{}'", other))),
        }
    }
}

/// Rendering settings shared by all backends
///
/// The defaults are conservative: a desktop viewport, a 30 second navigation
/// budget and a 10 second wait for the ready selector.
///
/// # Examples
///
/// ```
/// let cfg = wireframer::RenderConfig::default();
/// assert_eq!(cfg.ready_selector, "body");
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub backend: BackendKind,
    /// User agent string to send with requests
    pub user_agent: String,
    pub viewport: Viewport,
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
    /// How long to wait for `ready_selector` after navigation
    pub selector_timeout_ms: u64,
    /// Element that must exist before capture
    pub ready_selector: String,
    /// Extra pause after the page is ready, for late layout
    pub settle_ms: u64,
    /// Upper bound on captured elements
    pub max_nodes: usize,
    /// Chrome binary; auto-detected when unset
    pub chrome_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 Wireframer/0.1".to_string(),
            viewport: Viewport::default(),
            navigation_timeout_ms: 30000,
            selector_timeout_ms: 10000,
            ready_selector: "body".to_string(),
            settle_ms: 500,
            max_nodes: 5000,
            chrome_path: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct WireframeConfig {
    pub render: RenderConfig,
    pub generation: GenerationConfig,
    /// Generic values forced back to extracted tokens
    pub catalogue: GenericValueCatalogue,
    /// Include error causes in failure responses
    pub expose_error_details: bool,
    /// Length of the prompt preview in responses
    pub prompt_preview_chars: usize,
}

impl Default for WireframeConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            generation: GenerationConfig::default(),
            catalogue: GenericValueCatalogue::default(),
            expose_error_details: false,
            prompt_preview_chars: 500,
        }
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| Error::ConfigError(format!("{}={}: {}", key, value, e)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::ConfigError(format!("{}={}: expected a boolean", key, value))),
    }
}

impl WireframeConfig {
    /// Defaults overlaid with `WIREFRAME_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("WIREFRAME_BACKEND") {
            cfg.render.backend = v.parse()?;
        }
        if let Some(v) = lookup("WIREFRAME_USER_AGENT") {
            cfg.render.user_agent = v;
        }
        if let Some(v) = lookup("WIREFRAME_VIEWPORT") {
            cfg.render.viewport = v.parse()?;
        }
        if let Some(v) = lookup("WIREFRAME_NAVIGATION_TIMEOUT_MS") {
            cfg.render.navigation_timeout_ms = parse_var("WIREFRAME_NAVIGATION_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("WIREFRAME_SELECTOR_TIMEOUT_MS") {
            cfg.render.selector_timeout_ms = parse_var("WIREFRAME_SELECTOR_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("WIREFRAME_MAX_NODES") {
            cfg.render.max_nodes = parse_var("WIREFRAME_MAX_NODES", &v)?;
        }
        if let Some(v) = lookup("WIREFRAME_CHROME_PATH") {
            cfg.render.chrome_path = Some(PathBuf::from(v));
        }

        if let Some(v) = lookup("WIREFRAME_GENERATION_ENDPOINT") {
            cfg.generation.endpoint = v;
        }
        if let Some(v) = lookup("WIREFRAME_API_KEY") {
            cfg.generation.api_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Some(v) = lookup("WIREFRAME_MODEL") {
            cfg.generation.model = v;
        }
        if let Some(v) = lookup("WIREFRAME_MAX_TOKENS") {
            cfg.generation.max_tokens = parse_var("WIREFRAME_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("WIREFRAME_TEMPERATURE") {
            cfg.generation.temperature = parse_var("WIREFRAME_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("WIREFRAME_GENERATION_TIMEOUT_MS") {
            cfg.generation.timeout_ms = parse_var("WIREFRAME_GENERATION_TIMEOUT_MS", &v)?;
        }

        if let Some(v) = lookup("WIREFRAME_CATALOGUE") {
            cfg.catalogue = GenericValueCatalogue::load(std::path::Path::new(&v))?;
        }
        if let Some(v) = lookup("WIREFRAME_EXPOSE_ERROR_DETAILS") {
            cfg.expose_error_details = parse_flag("WIREFRAME_EXPOSE_ERROR_DETAILS", &v)?;
        }
        if let Some(v) = lookup("WIREFRAME_PROMPT_PREVIEW_CHARS") {
            cfg.prompt_preview_chars = parse_var("WIREFRAME_PROMPT_PREVIEW_CHARS", &v)?;
        }

        Ok(cfg)
    }
}

/// Build the rendering backend selected by `config.backend`.
///
/// `Auto` prefers the CDP backend when the `cdp` feature is enabled (default)
/// and falls back to the static backend otherwise.
pub fn default_backend(config: &RenderConfig) -> Result<Box<dyn RenderingBackend>> {
    match config.backend {
        BackendKind::Static => Ok(Box::new(static_page::StaticBackend::new(config.clone())?)),
        BackendKind::Cdp | BackendKind::Auto => cdp_or_fallback(config),
    }
}

#[cfg(feature = "cdp")]
fn cdp_or_fallback(config: &RenderConfig) -> Result<Box<dyn RenderingBackend>> {
    Ok(Box::new(cdp::CdpBackend::new(config.clone())))
}

#[cfg(not(feature = "cdp"))]
fn cdp_or_fallback(config: &RenderConfig) -> Result<Box<dyn RenderingBackend>> {
    if config.backend == BackendKind::Cdp {
        return Err(Error::ConfigError(
            "CDP backend requested but the `cdp` feature is disabled".into(),
        ));
    }
    Ok(Box::new(static_page::StaticBackend::new(config.clone())?))
}
