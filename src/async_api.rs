use crate::api::{WireframeRequest, WireframeResponse};
use crate::pipeline::Pipeline;
use crate::snapshot::WebsiteSnapshot;
use crate::{Error, Result, WireframeConfig};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Run(WireframeRequest, oneshot::Sender<Result<WireframeResponse>>),
    Analyze(String, oneshot::Sender<Result<WebsiteSnapshot>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly pipeline handle backed by a dedicated worker thread.
///
/// The worker thread owns the pipeline and runs requests one at a time, so
/// async callers never block their runtime on rendering or generation.
/// Handles are cheap to clone; all clones feed the same worker.
#[derive(Clone)]
pub struct AsyncPipeline {
    cmd_tx: Sender<Command>,
}

fn worker_loop(pipeline: Arc<Pipeline>, cmd_rx: mpsc::Receiver<Command>) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            Command::Run(request, resp) => {
                let res = pipeline.run(&request);
                let _ = resp.send(res);
            }
            Command::Analyze(url, resp) => {
                let res = pipeline.analyze(&url);
                let _ = resp.send(res);
            }
            Command::Close(resp) => {
                let _ = resp.send(Ok(()));
                break;
            }
        }
    }
}

impl AsyncPipeline {
    /// Spawn a worker around an existing pipeline.
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        thread::spawn(move || worker_loop(pipeline, cmd_rx));
        Self { cmd_tx }
    }

    /// Build the pipeline from `config` on the worker thread.
    pub async fn from_config(config: WireframeConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            let pipeline = match Pipeline::from_config(&config) {
                Ok(p) => Arc::new(p),
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));
            worker_loop(pipeline, cmd_rx);
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("Pipeline worker has shut down".into()))
    }

    /// Run a full wireframe request.
    pub async fn run(&self, request: WireframeRequest) -> Result<WireframeResponse> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Run(request, tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Run canceled: {}", e)))?
    }

    /// Render and extract only.
    pub async fn analyze(&self, url: &str) -> Result<WebsiteSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Analyze(url.to_string(), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Analyze canceled: {}", e)))?
    }

    /// Stop the worker after queued requests finish.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}
