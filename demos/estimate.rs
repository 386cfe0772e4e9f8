use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use ballspeed::extension::{collect_track, DetectionDump, Extension};
use ballspeed::frame::read_frames;
use ballspeed::{EstimatorConfig, VelocityEstimator};

// usage: estimate <detections file> [config.json] [dump file]
fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args();
    let _ = args.next();

    let dets_file_name = args.next().context("expected detections file name")?;
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            EstimatorConfig::from_json(&json)?
        }
        None => EstimatorConfig::default(),
    };

    let mut extensions: Vec<Box<dyn Extension>> = Vec::new();
    if let Some(dump_file_name) = args.next() {
        extensions.push(Box::new(DetectionDump::new(File::create(dump_file_name)?)));
    }

    let estimator = VelocityEstimator::new(&config)?;

    let reader = BufReader::new(
        File::open(&dets_file_name).with_context(|| format!("opening {}", dets_file_name))?,
    );
    let frames = read_frames(reader)?;
    let track = collect_track(&dets_file_name, frames, &mut extensions)?;

    log::info!(
        "{}: {} frames, {} identities",
        dets_file_name,
        track.len(),
        track.track_ids().len()
    );

    let speed = estimator.estimate_velocity(&track);
    if speed > 0.0 {
        println!("{:.1} km/h", speed);
    } else {
        println!("no confident measurement");
    }

    Ok(())
}
