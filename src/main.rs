//! Headless driver for the endless generated-content corridor.
#![forbid(unsafe_code)]

mod config;
mod driver;
mod viewer;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use corridor_content::GenerativeContentClient;
use corridor_runtime::Runtime;
use corridor_segment::SlotLayout;
use corridor_stream::WindowController;

use crate::config::{ContentConfig, CorridorConfig, TopicSwitch, load_config};
use crate::driver::Driver;
use crate::viewer::ScriptedWalker;

#[derive(Parser, Debug)]
#[command(author, version, about = "Walk an endless corridor decorated with generated content")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial topic (overrides the config)
    #[arg(long)]
    topic: Option<String>,

    /// Switch the topic at a tick, e.g. `300:deep ocean` (repeatable)
    #[arg(long = "switch", value_name = "TICK:TOPIC")]
    switches: Vec<TopicSwitch>,

    /// Ticks to run before printing the summary
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Tick rate; 0 runs as fast as possible
    #[arg(long)]
    fps: Option<u32>,

    /// Distance walked per tick
    #[arg(long)]
    speed: Option<f64>,

    /// Use the deterministic offline content source
    #[arg(long)]
    offline: bool,

    /// Key for the hosted content API
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => CorridorConfig::default(),
    };
    if let Some(topic) = args.topic {
        cfg.content.topic = topic;
    }
    if let Some(fps) = args.fps {
        cfg.viewer.fps = fps;
    }
    if let Some(speed) = args.speed {
        cfg.viewer.speed = speed;
    }
    if args.api_key.is_some() {
        cfg.content.api_key = args.api_key;
    }
    cfg.content.offline |= args.offline;
    cfg.validate()?;

    let client = build_client(&cfg.content)?;
    let runtime = Runtime::new(client, cfg.content.prompts.clone(), cfg.stream.runtime())?;
    let layout = SlotLayout::corridor(&cfg.corridor);
    log::info!(
        "corridor: segment length {}, {} slots per segment",
        cfg.corridor.length,
        layout.len()
    );
    let controller = WindowController::new(
        cfg.segment_length()?,
        layout,
        runtime,
        cfg.stream.retry_backoff_ticks,
    );
    let walker = ScriptedWalker::new(cfg.viewer.start, cfg.viewer.speed);
    let mut driver = Driver::new(
        controller,
        walker,
        cfg.content.topic.clone(),
        args.switches,
        cfg.viewer.fps,
    );

    let outcome = driver.run_and_settle(args.ticks, Duration::from_secs(10));
    println!("{}", driver.summary());
    outcome?;
    Ok(())
}

fn build_client(content: &ContentConfig) -> Result<Arc<dyn GenerativeContentClient>, Box<dyn Error>> {
    if content.offline {
        log::info!("content: offline (requested)");
        return Ok(Arc::new(content.offline_client()));
    }
    match content.usable_api_key() {
        #[cfg(feature = "live")]
        Some(key) => {
            let client = corridor_content::OpenAiClient::new(
                key,
                content.prompts.clone(),
                corridor_content::LiveOptions {
                    image_workers: content.image_workers,
                    ..Default::default()
                },
            )?;
            log::info!("content: hosted API");
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "live"))]
        Some(_) => {
            log::warn!("API key given but built without the `live` feature; using offline content");
            Ok(Arc::new(content.offline_client()))
        }
        None => {
            log::warn!("no usable API key; using offline content");
            Ok(Arc::new(content.offline_client()))
        }
    }
}
