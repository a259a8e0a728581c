use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use detect_api::config::CONFIG_FILE;
use detect_api::detector::{ClassNames, Detector};
use detect_api::server::{self, AppState};
use detect_api::settings::Settings;
use detect_api::storage::ArtifactStore;
use detect_api::torch::TorchDetector;
use detect_api::util::init_tracing;
use std::sync::Arc;
use std::{env, process};
use tracing::info;

const USAGE: &str = "usage: ./detect-api [config file]";

fn get_args() -> String {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => CONFIG_FILE.to_string(),
        2 => args[1].clone(),
        _ => {
            println!("{USAGE}");
            process::exit(1);
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load(&get_args())?;
    init_tracing(&settings.log_filter);
    info!("starting with {settings:?}");

    let names = match &settings.names_path {
        Some(path) => ClassNames::from_file(path)
            .with_context(|| format!("reading class names from {}", path.display()))?,
        None => ClassNames::coco(),
    };
    let detector: Arc<dyn Detector> = Arc::new(TorchDetector::new(
        &settings.model_path,
        names,
        settings.input_size,
        settings.iou_threshold,
    )?);

    let store = ArtifactStore::open(&settings.storage_dir)
        .with_context(|| format!("creating {}", settings.storage_dir.display()))?;
    info!("saving received images to {}", store.dir().display());

    let state = web::Data::new(AppState { detector, store });
    let max_payload = settings.max_payload_bytes;

    // Start the HTTP server
    let mut http = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(server::configure(max_payload))
    });
    if let Some(workers) = settings.workers {
        http = http.workers(workers);
    }

    info!("listening on {}", settings.bind);
    http.bind(&settings.bind)?.run().await?;
    Ok(())
}
