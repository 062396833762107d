mod common;

use std::sync::Arc;

use common::{fixture, fixture_dom, pipeline, FakeBackend, FakeGenerator};
use wireframer::{AsyncPipeline, Error, WireframeRequest};

#[tokio::test]
async fn async_run_and_analyze() {
    let backend = Arc::new(FakeBackend::new(fixture_dom("landing.html")));
    let generator = Arc::new(FakeGenerator::answering(&fixture("generic_candidate.html")));
    let handle = AsyncPipeline::new(Arc::new(pipeline(backend.clone(), generator)));

    let snapshot = handle.analyze("https://acme.test/").await.unwrap();
    assert_eq!(snapshot.sections().len(), 3);

    let resp = handle.clone().run(WireframeRequest::new("https://acme.test/")).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.analysis.navigation_links, 3);

    let err = handle.run(WireframeRequest::new("")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    handle.close().await.unwrap();
    assert_eq!(backend.opens(), 2);
    assert_eq!(backend.closes(), 2);
}

#[tokio::test]
async fn closed_worker_rejects_requests() {
    let backend = Arc::new(FakeBackend::new(fixture_dom("landing.html")));
    let generator = Arc::new(FakeGenerator::empty());
    let handle = AsyncPipeline::new(Arc::new(pipeline(backend, generator)));
    let other = handle.clone();
    handle.close().await.unwrap();

    // The worker may still be draining its channel; either error is fine.
    assert!(other.analyze("https://acme.test/").await.is_err());
}
