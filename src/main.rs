//! Cognitive Synapse desktop app
//!
//! An expandable graph of projects and experiences.

mod app;

use clap::Parser;
use cognitive_synapse::content::ContentRequest;
use eframe::egui;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Skip the remote content store and show the bundled portfolio
    #[arg(long)]
    bundled: bool,

    /// Load portfolio content from a local JSON file
    #[arg(long, value_name = "PATH", conflicts_with = "bundled")]
    content: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cognitive_synapse=info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title("Cognitive Synapse"),
        persist_window: true,
        ..Default::default()
    };

    // None means "use the configured remote source"
    let request = match (args.content, args.bundled) {
        (Some(path), _) => Some(ContentRequest::File(path)),
        (None, true) => Some(ContentRequest::BundledOnly),
        (None, false) => None,
    };
    let result = eframe::run_native(
        "Cognitive Synapse",
        options,
        Box::new(move |cc| Ok(Box::new(app::PortfolioApp::new(cc, request)))),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "could not open a drawing surface");
            eprintln!("cognitive-synapse: could not open a window: {e}");
            ExitCode::FAILURE
        }
    }
}
