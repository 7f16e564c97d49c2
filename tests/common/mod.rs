#![allow(dead_code)]

use std::io::Cursor;

use geoar_scene::interfaces::{MockDirectionsService, MockImageFetcher, RecordingSceneSink};
use geoar_scene::{
    CapturedPhoto, DevicePose, ExplorerConfig, ExplorerSession, GeoPoint, PlacementCommand,
    SessionEvent, UserLocation,
};
use image::{ImageFormat, RgbImage};

pub type MockSession = ExplorerSession<RecordingSceneSink, MockImageFetcher, MockDirectionsService>;

pub const METERS_PER_DEGREE: f64 = 111_194.93;

pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn north_of(point: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint::new(point.latitude + meters / METERS_PER_DEGREE, point.longitude)
}

pub fn photo_with_image(id: &str, at: GeoPoint) -> CapturedPhoto {
    CapturedPhoto::new(id, at).with_image(png_fixture(400, 300))
}

pub fn session_with(image_fetcher: MockImageFetcher, directions: MockDirectionsService) -> MockSession {
    session_with_config(ExplorerConfig::default(), image_fetcher, directions)
}

pub fn session_with_config(
    config: ExplorerConfig,
    image_fetcher: MockImageFetcher,
    directions: MockDirectionsService,
) -> MockSession {
    ExplorerSession::new(config, RecordingSceneSink::new(), image_fetcher, directions).unwrap()
}

pub fn session() -> MockSession {
    session_with(MockImageFetcher::new(), MockDirectionsService::new())
}

pub fn start_at(session: &mut MockSession, at: GeoPoint) {
    session.submit(SessionEvent::PoseUpdated(DevicePose::identity())).unwrap();
    session.submit(SessionEvent::LocationUpdated(UserLocation::new(at, 0))).unwrap();
}

pub fn move_to(session: &mut MockSession, at: GeoPoint, timestamp_ms: u64) {
    session
        .submit(SessionEvent::LocationUpdated(UserLocation::new(at, timestamp_ms)))
        .unwrap();
}

pub fn removed_ids(commands: &[PlacementCommand]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|command| match command {
            PlacementCommand::RemoveNode { node_id } => Some(node_id.as_str()),
            _ => None,
        })
        .collect()
}

pub fn added_ids(commands: &[PlacementCommand]) -> Vec<&str> {
    commands
        .iter()
        .filter(|command| command.is_add())
        .filter_map(|command| command.node_id())
        .collect()
}
