mod common;

use std::sync::Arc;

use common::{fixture, fixture_dom, pipeline, BrokenChecker, FakeBackend, FakeGenerator, Failure};
use wireframer::collaborators::{NoopAccessibilityChecker, NoopImages};
use wireframer::prompt;
use wireframer::static_page::parse_html;
use wireframer::{Error, WireframeRequest};

const URL: &str = "https://acme.test/";

fn landing() -> (Arc<FakeBackend>, Arc<FakeGenerator>) {
    (
        Arc::new(FakeBackend::new(fixture_dom("landing.html"))),
        Arc::new(FakeGenerator::answering(&fixture("generic_candidate.html"))),
    )
}

#[test]
fn full_run_forces_extracted_values() {
    let (backend, generator) = landing();
    let resp = pipeline(backend.clone(), generator.clone())
        .run(&WireframeRequest::new(URL))
        .expect("pipeline run");

    let html = &resp.html;
    assert!(html.contains("--color-1: rgb(255, 255, 255);"));
    assert!(html.contains("--font-1: Inter, sans-serif;"));
    assert!(html.contains("body { font-family: var(--font-1); color: var(--color-1); }"));
    assert!(html.contains(".hero { background: var(--color-2); padding: 64px; }"));
    assert!(html.contains("border: 1px solid var(--color-3);"));
    assert!(html.contains(r#"style="color: var(--color-4)""#));
    assert!(!html.to_lowercase().contains("#ccc"));

    // Variables land above the candidate's own rules.
    let vars_at = html.find(":root {").unwrap();
    let rules_at = html.find(".hero {").unwrap();
    assert!(vars_at < rules_at);

    // Accessibility fixes, then image placeholders.
    assert!(html.contains(r#"<html lang="en">"#));
    assert!(html.contains(r#"<img src="https://placehold.co/400x300" alt="">"#));
    assert_eq!(resp.accessibility.status, "fixed");
    assert_eq!(resp.accessibility.applied_fixes.as_ref().map(|f| f.len()), Some(2));

    assert_eq!(backend.opens(), 1);
    assert_eq!(backend.closes(), 1);
    assert_eq!(generator.calls(), 1);
}

#[test]
fn analysis_envelope() {
    let (backend, generator) = landing();
    let resp = pipeline(backend, generator).run(&WireframeRequest::new(URL)).unwrap();

    assert!(resp.success);
    assert_eq!(resp.source_url, URL);
    assert!(resp.generated_by.starts_with("wireframer/"));
    assert!(chrono::DateTime::parse_from_rfc3339(&resp.timestamp).is_ok());

    let a = &resp.analysis;
    assert_eq!(a.title, "Acme Cloud");
    assert_eq!(a.sections, 3);
    assert_eq!(a.components, 4);
    assert_eq!(a.detailed_sections, 3);
    assert_eq!(a.navigation_links, 3);
    assert_eq!(a.colors.total, 4);
    assert_eq!(a.colors.background, "rgb(255, 255, 255)");
    assert_eq!(a.colors.text, "rgb(17, 24, 39)");
    assert_eq!(
        a.color_palette,
        vec!["rgb(255, 255, 255)", "rgb(17, 24, 39)", "rgb(15, 23, 42)", "rgb(37, 99, 235)"]
    );
    assert!(a.wireframe_prompt.ends_with("..."));
    assert_eq!(a.wireframe_prompt.chars().count(), 503);

    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["analysis"]["detailedSections"], 3);
    assert!(json["accessibility"]["validationResults"].is_array());
}

#[test]
fn prompt_carries_literal_facts() {
    let (backend, generator) = landing();
    pipeline(backend, generator.clone()).run(&WireframeRequest::new(URL)).unwrap();

    let (system, task) = generator.seen.lock().unwrap()[0].clone();
    assert_eq!(system, prompt::SYSTEM_INSTRUCTION);
    assert!(task.contains("Use this exact color palette"));
    assert!(task.contains("rgb(37, 99, 235)"));
    assert!(task.contains(r#""Pricing" -> /pricing"#));
    assert!(task.contains(r#""Start free""#));
    assert!(task.contains("## Generation options"));
}

#[test]
fn render_error_closes_session_once() {
    let backend = Arc::new(FakeBackend::failing(fixture_dom("landing.html"), Failure::Capture));
    let generator = Arc::new(FakeGenerator::answering("<html></html>"));
    let err = pipeline(backend.clone(), generator.clone())
        .run(&WireframeRequest::new(URL))
        .unwrap_err();

    assert!(matches!(err, Error::RenderError(_)));
    assert_eq!(err.status(), 500);
    assert_eq!(backend.opens(), 1);
    assert_eq!(backend.closes(), 1);
    assert_eq!(generator.calls(), 0);
}

#[test]
fn failed_open_acquires_nothing() {
    let backend = Arc::new(FakeBackend::failing(fixture_dom("landing.html"), Failure::Open));
    let generator = Arc::new(FakeGenerator::answering("<html></html>"));
    let err = pipeline(backend.clone(), generator.clone())
        .run(&WireframeRequest::new(URL))
        .unwrap_err();

    assert!(matches!(err, Error::LoadError(_)));
    assert_eq!(backend.closes(), 0);
    assert_eq!(generator.calls(), 0);
}

#[test]
fn generation_error_is_fatal_after_close() {
    let backend = Arc::new(FakeBackend::new(fixture_dom("landing.html")));
    let generator = Arc::new(FakeGenerator::failing("quota exceeded"));
    let err = pipeline(backend.clone(), generator)
        .run(&WireframeRequest::new(URL))
        .unwrap_err();

    match err {
        Error::GenerationError(msg) => assert_eq!(msg, "quota exceeded"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(backend.opens(), 1);
    assert_eq!(backend.closes(), 1);
}

#[test]
fn invalid_url_never_opens_a_session() {
    let (backend, generator) = landing();
    let p = pipeline(backend.clone(), generator);
    for url in ["", "   ", "acme.test", "file:///etc/passwd"] {
        let err = p.run(&WireframeRequest::new(url)).unwrap_err();
        assert_eq!(err.status(), 400, "url {:?}", url);
    }
    assert_eq!(backend.opens(), 0);
}

#[test]
fn accessibility_failure_is_not_fatal() {
    let (backend, generator) = landing();
    let resp = pipeline(backend, generator)
        .with_accessibility(Arc::new(BrokenChecker))
        .run(&WireframeRequest::new(URL))
        .unwrap();

    assert_eq!(resp.accessibility.status, "failed");
    assert!(resp.accessibility.validation_results.is_none());
    assert!(!resp.html.contains(r#"lang="en""#));
    // Placeholders still apply.
    assert!(resp.html.contains("https://placehold.co/400x300"));
    assert!(resp.html.contains("var(--color-2)"));
}

#[test]
fn noop_collaborators_leave_markup_alone() {
    let (backend, generator) = landing();
    let resp = pipeline(backend, generator)
        .with_accessibility(Arc::new(NoopAccessibilityChecker::new()))
        .with_images(Arc::new(NoopImages::new()))
        .run(&WireframeRequest::new(URL))
        .unwrap();

    assert_eq!(resp.accessibility.status, "passed");
    assert!(resp.html.contains(r#"<img src="hero.png">"#));
    assert!(!resp.html.contains("placehold.co"));
    // Variables are still forced in.
    assert!(resp.html.contains("var(--color-2)"));
}

#[test]
fn accessibility_can_be_skipped() {
    let (backend, generator) = landing();
    let mut req = WireframeRequest::new(URL);
    req.include_accessibility = false;
    let resp = pipeline(backend, generator).run(&req).unwrap();
    assert_eq!(resp.accessibility.status, "skipped");
    assert!(!resp.html.contains(r#"lang="en""#));
}

#[test]
fn empty_generation_still_yields_token_document() {
    let backend = Arc::new(FakeBackend::new(fixture_dom("landing.html")));
    let generator = Arc::new(FakeGenerator::empty());
    let resp = pipeline(backend, generator).run(&WireframeRequest::new(URL)).unwrap();
    assert!(resp.html.starts_with("<head>\n<style>"));
    assert!(resp.html.contains("--color-1: rgb(255, 255, 255);"));
}

#[test]
fn page_without_nav_has_no_navigation_block() {
    let backend = Arc::new(FakeBackend::new(fixture_dom("no_nav.html")));
    let generator = Arc::new(FakeGenerator::answering("<html></html>"));
    let p = pipeline(backend, generator.clone());

    let snapshot = p.analyze(URL).unwrap();
    assert!(snapshot.navigation_links().is_empty());
    let doc = prompt::compile(&snapshot);
    assert!(!doc.has_section("Navigation"));
    assert!(doc.has_section("Sections"));

    let resp = p.run(&WireframeRequest::new(URL)).unwrap();
    assert_eq!(resp.analysis.navigation_links, 0);
    assert!(!generator.last_task().contains("## Navigation"));
}

#[test]
fn components_roll_up_across_sections() {
    let html = r#"<html><body><main>
        <section><h2>One</h2><button>A</button></section>
        <section><h2>Two</h2><button>B</button></section>
        <section><h2>Three</h2><button>C</button></section>
    </main></body></html>"#;
    let backend = Arc::new(FakeBackend::new(parse_html(html, URL, 1000)));
    let generator = Arc::new(FakeGenerator::answering("<html></html>"));
    let resp = pipeline(backend, generator).run(&WireframeRequest::new(URL)).unwrap();
    assert_eq!(resp.analysis.components, 3);
    assert_eq!(resp.analysis.detailed_sections, 3);
    assert_eq!(resp.analysis.sections, 1);
}

#[test]
fn same_page_same_snapshot() {
    let (backend, generator) = landing();
    let p = pipeline(backend.clone(), generator);
    let a = p.analyze(URL).unwrap();
    let b = p.analyze(URL).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(prompt::compile(&a), prompt::compile(&b));
    assert_eq!(backend.opens(), 2);
    assert_eq!(backend.closes(), 2);
}
