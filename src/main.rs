use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use wireframer::api::WireframeRequest;
use wireframer::prompt::{self, PromptOptions};
use wireframer::{server, BackendKind, Pipeline, Viewport, WireframeConfig};

/// Turn live web pages into high-fidelity HTML/CSS wireframes.
#[derive(Debug, Parser)]
#[command(name = "wireframer", version, about)]
struct Cli {
    /// Rendering backend: auto, cdp or static (overrides WIREFRAME_BACKEND)
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Viewport as WIDTHxHEIGHT (overrides WIREFRAME_VIEWPORT)
    #[arg(long, global = true)]
    viewport: Option<Viewport>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve POST/GET /api/wireframe
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print the extracted snapshot as JSON
    Analyze { url: String },
    /// Print the generation prompt
    Prompt {
        url: String,
        #[arg(long, default_value = "microsoft")]
        design_system: String,
    },
    /// Run the full pipeline and print (or write) the wireframe
    Generate {
        url: String,
        #[arg(long, default_value = "microsoft")]
        design_system: String,
        #[arg(long)]
        no_responsive: bool,
        #[arg(long)]
        no_accessibility: bool,
        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<WireframeConfig> {
    let mut config = WireframeConfig::from_env().context("Invalid WIREFRAME_* configuration")?;
    if let Some(backend) = cli.backend {
        config.render.backend = backend;
    }
    if let Some(viewport) = cli.viewport {
        config.render.viewport = viewport;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    match cli.command {
        Command::Serve { addr, workers } => {
            let workers = workers.unwrap_or_else(num_cpus::get);
            let server = server::WireframeServer::bind(&addr, Arc::new(pipeline), config.expose_error_details)?;
            server.run(workers)?;
        }
        Command::Analyze { url } => {
            let snapshot = pipeline.analyze(&url)?;
            let pretty = serde_json::to_string_pretty(&snapshot)?;
            println!("{}", pretty);
        }
        Command::Prompt { url, design_system } => {
            let snapshot = pipeline.analyze(&url)?;
            let options = PromptOptions {
                design_system,
                ..Default::default()
            };
            println!("{}", prompt::compile_with_options(&snapshot, &options).as_str());
        }
        Command::Generate {
            url,
            design_system,
            no_responsive,
            no_accessibility,
            output,
        } => {
            let request = WireframeRequest {
                url,
                design_system,
                include_responsive: !no_responsive,
                include_accessibility: !no_accessibility,
            };
            let response = pipeline.run(&request)?;
            info!(
                "{} sections, {} components, accessibility {}",
                response.analysis.sections, response.analysis.components, response.accessibility.status
            );
            match output {
                Some(path) => std::fs::write(&path, &response.html)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", response.html),
            }
        }
    }
    Ok(())
}
