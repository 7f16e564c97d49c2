mod common;

use common::*;
use geoar_scene::interfaces::{MockDirectionsService, MockImageFetcher};
use geoar_scene::{
    distance, CapturedPhoto, GeoPoint, NodeCategory, PitchCode, PlacementCommand, SessionEvent,
};

const BASEL_USER: GeoPoint = GeoPoint::new(47.5595, 7.5885);

#[test]
fn test_retraction_swaps_near_and_far_photo() {
    let origin = GeoPoint::new(47.0, 8.0);
    let mut session = session();
    start_at(&mut session, origin);
    session
        .submit(SessionEvent::PhotosChanged(vec![
            photo_with_image("p1", north_of(origin, 10.0)),
            photo_with_image("p2", north_of(origin, 60.0)),
        ]))
        .unwrap();
    session.process().unwrap();

    assert_eq!(session.sink().live_node_ids(), vec!["billboard:p1".to_string()]);

    // p1 is now 60 m behind, p2 10 m ahead
    move_to(&mut session, north_of(origin, 70.0), 1_000);
    session.process().unwrap();

    let batch = session.sink().last_batch().unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(removed_ids(batch), vec!["billboard:p1"]);
    assert_eq!(added_ids(batch), vec!["billboard:p2"]);
    assert!(matches!(batch[0], PlacementCommand::RemoveNode { .. }));
    assert_eq!(session.sink().live_node_ids(), vec!["billboard:p2".to_string()]);
}

#[test]
fn test_basel_scenario() {
    let photo_location = GeoPoint::new(47.5596, 7.5886);
    let mut session = session();
    start_at(&mut session, BASEL_USER);
    session
        .submit(SessionEvent::PhotosChanged(vec![CapturedPhoto::new("basel", photo_location)
            .with_orientation(90, 90.0, PitchCode::Flat)
            .with_image(png_fixture(400, 300))]))
        .unwrap();
    session.process().unwrap();

    let meters = distance(&BASEL_USER, &photo_location);
    assert!((meters - 13.4).abs() < 0.5, "distance was {}", meters);

    match session.sink().live_node("billboard:basel") {
        Some(PlacementCommand::AddBillboard {
            local_transform,
            width,
            height,
            texture_ref,
            double_sided,
            ..
        }) => {
            // flat capture swaps the 400x300 source
            assert!((width - 0.24).abs() < 1e-12);
            assert!((height - 0.32).abs() < 1e-12);
            assert_eq!(texture_ref, "basel");
            assert!(*double_sided);

            // north-east of the user: east is +X, north is -Z
            let position = local_transform.fixed_view::<3, 1>(0, 3).into_owned();
            assert!(position.x > 0.0);
            assert!(position.z < 0.0);
            assert!(position.y.abs() < 1e-9);
            assert!((position.norm() - meters).abs() < 1e-6);

            // bearing 90 turns the facing direction by -90 about up; yaw 90 adds no roll
            let facing = local_transform.fixed_view::<3, 1>(0, 2).into_owned();
            assert!((facing.x + 1.0).abs() < 1e-9);
            assert!(facing.y.abs() < 1e-9);
            assert!(facing.z.abs() < 1e-9);
        }
        other => panic!("expected billboard, got {:?}", other),
    }
    assert_eq!(session.status().message, "1 AR images placed");
}

#[test]
fn test_unchanged_inputs_emit_nothing() {
    let mut session = session();
    start_at(&mut session, BASEL_USER);
    session
        .submit(SessionEvent::PhotosChanged(vec![photo_with_image(
            "a",
            north_of(BASEL_USER, 5.0),
        )]))
        .unwrap();
    session.process().unwrap();
    let batches = session.sink().batches().len();

    // same collection delivered again
    session
        .submit(SessionEvent::PhotosChanged(vec![photo_with_image(
            "a",
            north_of(BASEL_USER, 5.0),
        )]))
        .unwrap();
    let summary = session.process().unwrap();

    assert_eq!(summary.reconciliation_passes, 1);
    assert_eq!(summary.commands_emitted, 0);
    assert_eq!(session.sink().batches().len(), batches);
}

#[test]
fn test_removed_photo_is_retracted() {
    let mut session = session();
    start_at(&mut session, BASEL_USER);
    session
        .submit(SessionEvent::PhotosChanged(vec![
            photo_with_image("a", north_of(BASEL_USER, 5.0)),
            photo_with_image("b", north_of(BASEL_USER, 8.0)),
        ]))
        .unwrap();
    session.process().unwrap();
    assert_eq!(session.sink().live_count(NodeCategory::Billboards), 2);

    session
        .submit(SessionEvent::PhotosChanged(vec![photo_with_image(
            "b",
            north_of(BASEL_USER, 8.0),
        )]))
        .unwrap();
    session.process().unwrap();

    assert_eq!(removed_ids(session.sink().last_batch().unwrap()), vec!["billboard:a"]);
    assert_eq!(session.sink().live_node_ids(), vec!["billboard:b".to_string()]);
}

#[test]
fn test_deferred_image_placement() {
    let mut fetcher = MockImageFetcher::new();
    fetcher.insert_image("remote", png_fixture(300, 400));
    let mut session = session_with(fetcher, MockDirectionsService::new());
    start_at(&mut session, BASEL_USER);
    session
        .submit(SessionEvent::PhotosChanged(vec![
            CapturedPhoto::new("remote", north_of(BASEL_USER, 6.0)),
            photo_with_image("local", north_of(BASEL_USER, 9.0)),
        ]))
        .unwrap();
    session.process().unwrap();

    // the local photo does not wait for the remote one
    assert_eq!(session.sink().live_node_ids(), vec!["billboard:local".to_string()]);
    assert_eq!(session.status().pending_images, 1);
    assert_eq!(session.image_fetcher().requests(), ["remote".to_string()]);

    session.image_fetcher_mut().deliver_all().unwrap();
    session.process().unwrap();

    assert_eq!(added_ids(session.sink().last_batch().unwrap()), vec!["billboard:remote"]);
    assert_eq!(session.sink().live_count(NodeCategory::Billboards), 2);
    assert_eq!(session.status().pending_images, 0);
    assert_eq!(session.reporter().count("MissingImageData"), 1);
}

#[test]
fn test_immediate_replies_are_coalesced_into_one_call() {
    let mut fetcher = MockImageFetcher::immediate();
    fetcher.insert_image("remote", png_fixture(300, 400));
    let mut session = session_with(fetcher, MockDirectionsService::new());
    start_at(&mut session, BASEL_USER);
    session
        .submit(SessionEvent::PhotosChanged(vec![CapturedPhoto::new(
            "remote",
            north_of(BASEL_USER, 6.0),
        )]))
        .unwrap();

    let summary = session.process().unwrap();

    assert_eq!(summary.reconciliation_passes, 2);
    assert_eq!(session.sink().batches().len(), 1);
    let adds = session
        .sink()
        .all_commands()
        .filter(|command| matches!(command, PlacementCommand::AddBillboard { .. }))
        .count();
    assert_eq!(adds, 1);
}

#[test]
fn test_undecodable_image_is_skipped() {
    let mut session = session();
    start_at(&mut session, BASEL_USER);
    session
        .submit(SessionEvent::PhotosChanged(vec![
            CapturedPhoto::new("broken", north_of(BASEL_USER, 4.0)).with_image(vec![0, 1, 2, 3]),
            photo_with_image("fine", north_of(BASEL_USER, 7.0)),
        ]))
        .unwrap();
    session.process().unwrap();

    assert_eq!(session.sink().live_node_ids(), vec!["billboard:fine".to_string()]);
    assert_eq!(session.reporter().count("UndecodableImage"), 1);
}
