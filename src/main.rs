//! Scripted walk through a small photo collection using in-memory collaborators.
//!
//! Usage: `geoar_scene [config.json]`. Set `RUST_LOG` to override the log
//! level from the configuration.

use std::env;
use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use log::{error, info};

use geoar_scene::interfaces::{MockDirectionsService, MockImageFetcher, RecordingSceneSink};
use geoar_scene::{
    CapturedPhoto, ConfigurationManager, DevicePose, ExplorerSession, GeoPoint, PitchCode,
    PlacementCommand, SessionEvent, UserLocation,
};

/// Meters per degree of latitude on the reference sphere
const METERS_PER_DEGREE: f64 = 111_194.93;

fn encoded_png(width: u32, height: u32) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    RgbImage::new(width, height).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn north_of(point: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint::new(point.latitude + meters / METERS_PER_DEGREE, point.longitude)
}

fn describe(command: &PlacementCommand) -> String {
    match command {
        PlacementCommand::AddBillboard { node_id, local_transform, width, height, .. } => format!(
            "add {} {:.2}x{:.2} m at ({:.1}, {:.1}, {:.1})",
            node_id,
            width,
            height,
            local_transform[(0, 3)],
            local_transform[(1, 3)],
            local_transform[(2, 3)]
        ),
        PlacementCommand::AddLineSegment { node_id, cylinder, .. } => {
            format!("add {} length {:.1} m", node_id, cylinder.height)
        }
        PlacementCommand::AddPointMarker { node_id, at_local, .. } => format!(
            "add {} at ({:.1}, {:.1}, {:.1})",
            node_id, at_local.x, at_local.y, at_local.z
        ),
        PlacementCommand::RemoveNode { node_id } => format!("remove {}", node_id),
        PlacementCommand::ClearCategory { category } => format!("clear {:?}", category),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let manager = match env::args().nth(1) {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    let config = manager.create_snapshot();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    let start = GeoPoint::new(47.5595, 7.5885);
    let cathedral = north_of(start, 40.0);

    let mut image_fetcher = MockImageFetcher::immediate();
    image_fetcher.insert_image("cathedral", encoded_png(640, 480)?);

    let mut directions = MockDirectionsService::immediate();
    directions.set_route(Some(vec![
        north_of(start, 10.0),
        GeoPoint::new(start.latitude + 20.0 / METERS_PER_DEGREE, start.longitude + 0.0001),
        north_of(start, 30.0),
    ]));

    let mut session = ExplorerSession::new(config, RecordingSceneSink::new(), image_fetcher, directions)?;

    let photos = vec![
        CapturedPhoto::new("fountain", north_of(start, 12.0))
            .with_orientation(90, 0.0, PitchCode::Flat)
            .with_image(encoded_png(400, 300)?),
        CapturedPhoto::new("cathedral", cathedral).with_orientation(180, 90.0, PitchCode::PitchedUp),
        CapturedPhoto::new("bridge", north_of(start, 120.0))
            .with_orientation(0, 90.0, PitchCode::Flat)
            .with_image(encoded_png(300, 400)?),
    ];

    session.submit(SessionEvent::PoseUpdated(DevicePose::identity()))?;
    session.submit(SessionEvent::PhotosChanged(photos))?;
    session.submit(SessionEvent::NavigationTargetSet { destination: cathedral })?;

    for step in 0..8u64 {
        let location = north_of(start, step as f64 * 15.0);
        session.submit(SessionEvent::LocationUpdated(UserLocation::new(location, step * 10_000)))?;
        if step == 5 {
            session.submit(SessionEvent::SessionReset)?;
            session.submit(SessionEvent::PoseUpdated(DevicePose::identity()))?;
        }

        let summary = session.process()?;
        info!(
            "Step {}: {} events, {} passes, {} commands",
            step, summary.events_processed, summary.reconciliation_passes, summary.commands_emitted
        );
    }

    for (index, batch) in session.sink().batches().iter().enumerate() {
        info!("Batch {} ({} commands)", index, batch.len());
        for command in batch {
            info!("  {}", describe(command));
        }
    }

    let status = session.status();
    info!(
        "{} | {} billboards, {} route nodes, {} errors reported",
        status.message,
        status.placed_billboards,
        status.route_nodes,
        session.reporter().total_reported()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("geoar_scene: {}", e);
        std::process::exit(1);
    }
}
