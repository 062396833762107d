//! Wire types for the wireframe endpoint (camelCase JSON).

use serde::{Deserialize, Serialize};

use crate::collaborators::AccessibilityIssue;
use crate::prompt::PromptOptions;
use crate::snapshot::{Hierarchy, Spacing, Typography, WebsiteSnapshot};
use crate::{Error, Result};

fn default_design_system() -> String {
    "microsoft".to_string()
}

fn yes() -> bool {
    true
}

/// Incoming request. Only `url` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireframeRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_design_system")]
    pub design_system: String,
    #[serde(default = "yes")]
    pub include_responsive: bool,
    #[serde(default = "yes")]
    pub include_accessibility: bool,
}

impl WireframeRequest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            design_system: default_design_system(),
            include_responsive: true,
            include_accessibility: true,
        }
    }

    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::InvalidInput(format!("Malformed request body: {}", e)))
    }

    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            design_system: self.design_system.clone(),
            include_responsive: self.include_responsive,
            include_accessibility: self.include_accessibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorSummary {
    pub total: usize,
    /// Body background color
    pub background: String,
    /// Body text color
    pub text: String,
}

/// Analysis block of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub title: String,
    pub url: String,
    /// Landmark regions: header + main + sidebar + footer counts
    pub sections: usize,
    /// Buttons, images, links and forms summed over the detailed sections
    pub components: usize,
    pub colors: ColorSummary,
    pub color_palette: Vec<String>,
    pub typography: Typography,
    pub spacing: Spacing,
    pub hierarchy: Hierarchy,
    pub detailed_sections: usize,
    pub navigation_links: usize,
    pub wireframe_prompt: String,
}

impl AnalysisSummary {
    pub fn from_snapshot(snapshot: &WebsiteSnapshot, prompt_preview: String) -> Self {
        let body = &snapshot.hierarchy().body;
        Self {
            title: snapshot.title().to_string(),
            url: snapshot.source_url().to_string(),
            sections: snapshot.structure_counts().region_count(),
            components: snapshot.component_count(),
            colors: ColorSummary {
                total: snapshot.color_palette().len(),
                background: body.get("background-color").to_string(),
                text: body.get("color").to_string(),
            },
            color_palette: snapshot.color_palette().to_vec(),
            typography: snapshot.typography().clone(),
            spacing: snapshot.spacing().clone(),
            hierarchy: snapshot.hierarchy().clone(),
            detailed_sections: snapshot.sections().len(),
            navigation_links: snapshot.navigation_links().len(),
            wireframe_prompt: prompt_preview,
        }
    }
}

/// Outcome of the optional accessibility stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityStatus {
    /// `passed`, `fixed`, `issues`, `failed` or `skipped`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_results: Option<Vec<AccessibilityIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_fixes: Option<Vec<String>>,
}

impl AccessibilityStatus {
    pub fn skipped() -> Self {
        Self::bare("skipped")
    }

    pub fn failed() -> Self {
        Self::bare("failed")
    }

    fn bare(status: &str) -> Self {
        Self {
            status: status.to_string(),
            validation_results: None,
            applied_fixes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireframeResponse {
    pub success: bool,
    pub html: String,
    pub analysis: AnalysisSummary,
    pub source_url: String,
    pub generated_by: String,
    /// RFC 3339
    pub timestamp: String,
    pub accessibility: AccessibilityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FailureResponse {
    /// Input errors carry their own message; everything else is reported
    /// generically, with the cause in `details` only when `expose_details`.
    pub fn from_error(err: &Error, expose_details: bool) -> Self {
        match err {
            Error::InvalidInput(msg) => Self {
                success: false,
                error: msg.clone(),
                details: None,
            },
            other => Self {
                success: false,
                error: "Failed to generate wireframe".to_string(),
                details: expose_details.then(|| other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomNode, RenderedDom};
    use crate::normalize::extract;

    #[test]
    fn request_defaults() {
        let req = WireframeRequest::from_json(r#"{"url":"https://a.test"}"#).unwrap();
        assert_eq!(req, WireframeRequest::new("https://a.test"));
        assert_eq!(req.prompt_options(), PromptOptions::default());

        let req = WireframeRequest::from_json(r#"{"url":"x","includeResponsive":false,"designSystem":"material"}"#).unwrap();
        assert!(!req.include_responsive);
        assert!(req.include_accessibility);
        assert_eq!(req.design_system, "material");

        assert_eq!(WireframeRequest::from_json("{}").unwrap().url, "");
        assert!(matches!(WireframeRequest::from_json("nope"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn failure_details_are_gated() {
        let err = Error::RenderError("tab crashed".into());
        let hidden = FailureResponse::from_error(&err, false);
        assert_eq!(hidden.error, "Failed to generate wireframe");
        assert!(hidden.details.is_none());
        let json = serde_json::to_value(&hidden).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "Failed to generate wireframe"}));

        let shown = FailureResponse::from_error(&err, true);
        assert_eq!(shown.details.as_deref(), Some("Rendering failed: tab crashed"));

        let input = FailureResponse::from_error(&Error::InvalidInput("URL is required".into()), true);
        assert_eq!(input.error, "URL is required");
        assert!(input.details.is_none());
    }

    #[test]
    fn analysis_counts() {
        let mut dom = RenderedDom::new("Shop", "https://shop.test/");
        let html = dom.push(None, DomNode::new("html"));
        let body = dom.push(
            Some(html),
            DomNode::new("body")
                .with_style("background-color", "rgb(255, 255, 255)")
                .with_style("color", "rgb(0, 0, 0)"),
        );
        dom.push(Some(body), DomNode::new("header"));
        let main = dom.push(Some(body), DomNode::new("main"));
        for i in 0..3 {
            let s = dom.push(Some(main), DomNode::new("section"));
            dom.push(Some(s), DomNode::new("button").with_text(&format!("Buy {}", i)));
        }
        dom.push(Some(body), DomNode::new("footer"));

        let snap = extract(&dom);
        let summary = AnalysisSummary::from_snapshot(&snap, "preview".into());
        assert_eq!(summary.sections, 3);
        assert_eq!(summary.components, 3);
        assert_eq!(summary.detailed_sections, 3);
        assert_eq!(summary.navigation_links, 0);
        assert_eq!(summary.colors.background, "rgb(255, 255, 255)");
        assert_eq!(summary.colors.text, "rgb(0, 0, 0)");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["detailedSections"], 3);
        assert_eq!(json["wireframePrompt"], "preview");
    }
}
