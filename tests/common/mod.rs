#![allow(dead_code)]

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wireframer::backend::{PageSession, RenderingBackend};
use wireframer::collaborators::{AccessibilityChecker, AccessibilityReport};
use wireframer::dom::RenderedDom;
use wireframer::generation::GenerationService;
use wireframer::static_page::parse_html;
use wireframer::{Error, Pipeline, Result, WireframeConfig};

pub fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{}", name)).expect("Failed to read fixture")
}

pub fn fixture_dom(name: &str) -> RenderedDom {
    parse_html(&fixture(name), "https://acme.test/", 5000)
}

#[derive(Clone, Copy, PartialEq)]
pub enum Failure {
    None,
    Open,
    Capture,
}

/// Backend that serves a canned DOM and counts session lifecycle calls.
pub struct FakeBackend {
    dom: RenderedDom,
    failure: Failure,
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new(dom: RenderedDom) -> Self {
        Self::failing(dom, Failure::None)
    }

    pub fn failing(dom: RenderedDom, failure: Failure) -> Self {
        Self {
            dom,
            failure,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    dom: RenderedDom,
    fail_capture: bool,
    closes: Arc<AtomicUsize>,
}

impl RenderingBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn open(&self, _url: &str) -> Result<Box<dyn PageSession>> {
        if self.failure == Failure::Open {
            return Err(Error::LoadError("connection refused".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            dom: self.dom.clone(),
            fail_capture: self.failure == Failure::Capture,
            closes: Arc::clone(&self.closes),
        }))
    }
}

impl PageSession for FakeSession {
    fn capture(&mut self) -> Result<RenderedDom> {
        if self.fail_capture {
            return Err(Error::RenderError("tab crashed".into()));
        }
        Ok(self.dom.clone())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Generator returning a fixed answer and recording the prompts it saw.
pub struct FakeGenerator {
    answer: std::result::Result<Option<String>, String>,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl FakeGenerator {
    pub fn answering(markup: &str) -> Self {
        Self {
            answer: Ok(Some(markup.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self {
            answer: Ok(None),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            answer: Err(msg.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_task(&self) -> String {
        self.seen.lock().unwrap().last().map(|(_, t)| t.clone()).unwrap_or_default()
    }
}

impl GenerationService for FakeGenerator {
    fn complete(&self, system: &str, task: &str) -> Result<Option<String>> {
        self.seen.lock().unwrap().push((system.to_string(), task.to_string()));
        match &self.answer {
            Ok(v) => Ok(v.clone()),
            Err(msg) => Err(Error::GenerationError(msg.clone())),
        }
    }
}

pub struct BrokenChecker;

impl AccessibilityChecker for BrokenChecker {
    fn check(&self, _html: &str) -> Result<AccessibilityReport> {
        Err(Error::AccessibilityError("validator unavailable".into()))
    }
}

pub fn pipeline(backend: Arc<FakeBackend>, generator: Arc<FakeGenerator>) -> Pipeline {
    Pipeline::new(backend, generator, &WireframeConfig::default()).unwrap()
}
