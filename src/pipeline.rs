//! Request driver.
//!
//! One sequential pass per request:
//!
//! ```text
//! validate → open session → capture → sample + normalize → close
//!          → compile prompt + synthesize variables → generate
//!          → reconcile → accessibility (optional) → image placeholders
//!          → response envelope
//! ```
//!
//! Every external call is reduced to a [`StageOutcome`] and the driver alone
//! decides whether the request continues.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::api::{AccessibilityStatus, AnalysisSummary, WireframeRequest, WireframeResponse};
use crate::backend::{RenderingBackend, SessionGuard};
use crate::collaborators::{
    AccessibilityChecker, AccessibilityReport, BasicAccessibilityChecker, ImagePlaceholderRewriter,
    PlaceholderImages,
};
use crate::generation::{ChatCompletionsClient, GenerationService};
use crate::normalize;
use crate::prompt::{self, SYSTEM_INSTRUCTION};
use crate::reconcile::Reconciler;
use crate::snapshot::WebsiteSnapshot;
use crate::style_vars;
use crate::{Error, Result, WireframeConfig};

/// Tagged result of one external stage.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Success(T),
    /// The request continues without this stage's output
    Recoverable(Error),
    /// The request ends with this error
    Fatal(Error),
}

impl<T> StageOutcome<T> {
    /// For stages the request cannot continue without: any failure ends it.
    pub fn required(self) -> Result<T> {
        match self {
            StageOutcome::Success(v) => Ok(v),
            StageOutcome::Recoverable(e) | StageOutcome::Fatal(e) => Err(e),
        }
    }
}

/// Check that `url` is an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<url::Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("URL is required".into()));
    }
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| Error::InvalidInput(format!("Invalid URL '{}': {}", trimmed, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::InvalidInput(format!("Unsupported URL scheme '{}'", other))),
    }
}

/// Wires the collaborators together. Cheap to share behind an `Arc`.
pub struct Pipeline {
    backend: Arc<dyn RenderingBackend>,
    generator: Arc<dyn GenerationService>,
    accessibility: Arc<dyn AccessibilityChecker>,
    images: Arc<dyn ImagePlaceholderRewriter>,
    reconciler: Reconciler,
    prompt_preview_chars: usize,
    generated_by: String,
}

impl Pipeline {
    /// Pipeline with the given backend and generator and the default
    /// accessibility and image collaborators.
    pub fn new(
        backend: Arc<dyn RenderingBackend>,
        generator: Arc<dyn GenerationService>,
        config: &WireframeConfig,
    ) -> Result<Self> {
        let reconciler = Reconciler::new(config.catalogue.clone())?;
        debug!(
            "Generic value catalogue v{} ({} colors, {} fonts)",
            reconciler.catalogue().version,
            reconciler.catalogue().colors.len(),
            reconciler.catalogue().fonts.len()
        );
        Ok(Self {
            backend,
            generator,
            accessibility: Arc::new(BasicAccessibilityChecker::new()?),
            images: Arc::new(PlaceholderImages::new()?),
            reconciler,
            prompt_preview_chars: config.prompt_preview_chars,
            generated_by: format!(
                "wireframer/{} ({})",
                env!("CARGO_PKG_VERSION"),
                config.generation.model
            ),
        })
    }

    /// Pipeline built entirely from configuration.
    pub fn from_config(config: &WireframeConfig) -> Result<Self> {
        let backend: Arc<dyn RenderingBackend> = Arc::from(crate::default_backend(&config.render)?);
        let generator = Arc::new(ChatCompletionsClient::new(config.generation.clone())?);
        Self::new(backend, generator, config)
    }

    pub fn with_accessibility(mut self, checker: Arc<dyn AccessibilityChecker>) -> Self {
        self.accessibility = checker;
        self
    }

    pub fn with_images(mut self, rewriter: Arc<dyn ImagePlaceholderRewriter>) -> Self {
        self.images = rewriter;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Render `url` and extract its snapshot. The session is closed before
    /// this returns, whatever the outcome.
    pub fn analyze(&self, url: &str) -> Result<WebsiteSnapshot> {
        let url = validate_url(url)?;
        self.render_stage(url.as_str()).required()
    }

    fn render_stage(&self, url: &str) -> StageOutcome<WebsiteSnapshot> {
        let session = match self.backend.open(url) {
            Ok(s) => s,
            Err(e) => return StageOutcome::Fatal(e),
        };
        let mut guard = SessionGuard::new(session);
        let captured = guard.capture();
        if let Err(e) = guard.close() {
            warn!("Failed to close {} session for {}: {}", self.backend.name(), url, e);
        }
        match captured {
            Ok(dom) => {
                let snapshot = normalize::extract(&dom);
                debug!(
                    "Extracted snapshot {} ({} sections, {} colors)",
                    snapshot.fingerprint(),
                    snapshot.sections().len(),
                    snapshot.color_palette().len()
                );
                StageOutcome::Success(snapshot)
            }
            Err(e) => StageOutcome::Fatal(e),
        }
    }

    fn generation_stage(&self, task: &str) -> StageOutcome<String> {
        match self.generator.complete(SYSTEM_INSTRUCTION, task) {
            Ok(Some(markup)) => StageOutcome::Success(markup),
            Ok(None) => {
                warn!("Generation service returned no content");
                StageOutcome::Success(String::new())
            }
            Err(Error::Timeout(ms)) => StageOutcome::Fatal(Error::Timeout(ms)),
            Err(Error::GenerationError(msg)) => StageOutcome::Fatal(Error::GenerationError(msg)),
            Err(e) => StageOutcome::Fatal(Error::GenerationError(e.to_string())),
        }
    }

    fn accessibility_stage(&self, html: &str) -> StageOutcome<AccessibilityReport> {
        match self.accessibility.check(html) {
            Ok(report) => StageOutcome::Success(report),
            Err(e) => StageOutcome::Recoverable(e),
        }
    }

    /// Run the whole request.
    pub fn run(&self, request: &WireframeRequest) -> Result<WireframeResponse> {
        let url = validate_url(&request.url)?;
        info!("Generating wireframe for {} via {}", url, self.backend.name());

        let snapshot = self.render_stage(url.as_str()).required()?;

        let prompt = prompt::compile_with_options(&snapshot, &request.prompt_options());
        let variables = style_vars::synthesize(&snapshot);
        debug!(
            "Compiled prompt ({} bytes) and {} style tokens",
            prompt.len(),
            variables.tokens.len()
        );

        let candidate = self.generation_stage(prompt.as_str()).required()?;

        let reconciled = self.reconciler.reconcile(&candidate, &variables);
        debug!(
            "Reconciliation forced {} substitution(s)",
            reconciled.substitutions.len()
        );
        let mut html = reconciled.html;

        let accessibility = if request.include_accessibility {
            match self.accessibility_stage(&html) {
                StageOutcome::Success(report) => {
                    let status = accessibility_status(&report);
                    if let Some(fixed) = report.fixed_html {
                        html = fixed;
                    }
                    status
                }
                StageOutcome::Recoverable(e) | StageOutcome::Fatal(e) => {
                    warn!("Accessibility check failed, continuing with unfixed markup: {}", e);
                    AccessibilityStatus::failed()
                }
            }
        } else {
            AccessibilityStatus::skipped()
        };

        let html = self.images.rewrite(&html);

        info!(
            "Wireframe ready for {} ({} bytes, {} sections)",
            url,
            html.len(),
            snapshot.sections().len()
        );
        Ok(WireframeResponse {
            success: true,
            html,
            analysis: AnalysisSummary::from_snapshot(
                &snapshot,
                prompt.preview(self.prompt_preview_chars),
            ),
            source_url: url.to_string(),
            generated_by: self.generated_by.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            accessibility,
        })
    }
}

fn accessibility_status(report: &AccessibilityReport) -> AccessibilityStatus {
    let fixes = report.applied_fixes();
    let status = if report.is_valid {
        "passed"
    } else if report.issues.iter().all(|i| i.fixed) {
        "fixed"
    } else {
        "issues"
    };
    AccessibilityStatus {
        status: status.to_string(),
        validation_results: Some(report.issues.clone()),
        applied_fixes: (!fixes.is_empty()).then_some(fixes),
    }
}
