//! Event-driven placement session
//!
//! Owns the redraw state machine: external updates and collaborator
//! completions arrive as [`SessionEvent`]s on one channel, are drained on the
//! session thread by [`ExplorerSession::process`], and mark the billboard or
//! route category dirty. Dirty categories are reconciled at most once per
//! pass; events arriving during a pass are coalesced into the next one.

use std::collections::{HashMap, HashSet};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};

use crate::algorithms::{geodesy, PlacementEngine, RouteProjector};
use crate::api::types::{
    ApiResult, PlacementCommand, ProcessSummary, RouteRequest, RouteRequestId, SessionEvent,
    SessionStatus,
};
use crate::core::{CapturedPhoto, DevicePose, GeoPoint, Transform4, TrackingState, UserLocation};
use crate::interfaces::{
    CollaboratorError, DirectionsService, EventSender, ImageFetcher, SceneSink,
};
use crate::processing::SceneMutationLog;
use crate::utils::config::{ConfigurationManager, ExplorerConfig};
use crate::validation::{DataValidator, ErrorReporter, PlacementError};

/// Upper bound on reconciliation passes per `process` call
const MAX_RECONCILIATION_PASSES: usize = 8;

/// Active navigation target
#[derive(Debug, Clone)]
struct Navigation {
    destination: GeoPoint,
    /// Last successfully computed waypoints
    waypoints: Option<Vec<GeoPoint>>,
    /// Only the result of this request is applied
    active_request: Option<RouteRequestId>,
}

/// AR photo exploration session
pub struct ExplorerSession<S, I, D>
where
    S: SceneSink,
    I: ImageFetcher,
    D: DirectionsService,
{
    config: ExplorerConfig,
    engine: PlacementEngine,
    projector: RouteProjector,
    scene_log: SceneMutationLog,
    reporter: ErrorReporter,
    sink: S,
    image_fetcher: I,
    directions: D,
    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
    photos: Vec<CapturedPhoto>,
    /// Full images fetched during this session, by photo id
    image_cache: HashMap<String, Vec<u8>>,
    /// Photo ids with a fetch in flight
    pending_images: HashSet<String>,
    user_location: Option<UserLocation>,
    last_redraw_location: Option<GeoPoint>,
    /// Camera pose in the current tracking frame; `None` until the first pose
    /// and again after every reset
    pose: Option<DevicePose>,
    tracking_state: Option<TrackingState>,
    /// Reset epoch the current pose belongs to
    frame_epoch: u64,
    navigation: Option<Navigation>,
    route_request_counter: u64,
    billboards_dirty: bool,
    route_dirty: bool,
    /// Category clears not yet accepted by the sink
    pending_clears: Vec<PlacementCommand>,
    message: String,
}

impl<S, I, D> ExplorerSession<S, I, D>
where
    S: SceneSink,
    I: ImageFetcher,
    D: DirectionsService,
{
    /// Create a session with validated configuration and its collaborators
    pub fn new(config: ExplorerConfig, sink: S, image_fetcher: I, directions: D) -> ApiResult<Self> {
        let validation = ConfigurationManager::validate(&config);
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error.into());
        }
        for warning in &validation.warnings {
            warn!("{}", warning);
        }

        let (event_tx, event_rx) = unbounded();
        Ok(Self {
            engine: PlacementEngine::new(config.placement.clone()),
            projector: RouteProjector::new(config.route.clone()),
            config,
            scene_log: SceneMutationLog::new(),
            reporter: ErrorReporter::new(),
            sink,
            image_fetcher,
            directions,
            event_tx,
            event_rx,
            photos: Vec::new(),
            image_cache: HashMap::new(),
            pending_images: HashSet::new(),
            user_location: None,
            last_redraw_location: None,
            pose: None,
            tracking_state: None,
            frame_epoch: 0,
            navigation: None,
            route_request_counter: 0,
            billboards_dirty: false,
            route_dirty: false,
            pending_clears: Vec::new(),
            message: "Waiting for location".to_string(),
        })
    }

    /// Handle for posting events from other threads or collaborators
    pub fn event_sender(&self) -> EventSender {
        EventSender::new(self.event_tx.clone())
    }

    /// Queue an event; it takes effect on the next `process` call
    pub fn submit(&self, event: SessionEvent) -> ApiResult<()> {
        self.event_tx
            .send(event)
            .map_err(|_| CollaboratorError::ChannelClosed)?;
        Ok(())
    }

    /// Drain queued events and run reconciliation passes until the scene is
    /// up to date.
    ///
    /// On a sink failure the scene is scheduled for full regeneration and the
    /// error is returned; the next call retries.
    pub fn process(&mut self) -> ApiResult<ProcessSummary> {
        let mut summary = ProcessSummary::default();

        loop {
            summary.events_processed += self.drain_events();

            if self.needs_reconciliation() {
                if summary.reconciliation_passes >= MAX_RECONCILIATION_PASSES {
                    warn!(
                        "Stopping after {} reconciliation passes; remaining work deferred",
                        summary.reconciliation_passes
                    );
                    break;
                }
                summary.commands_emitted += self.reconcile()?;
                summary.reconciliation_passes += 1;
                continue;
            }

            // clears from a reset go out even while no pose is available
            if !self.pending_clears.is_empty() {
                summary.commands_emitted += self.apply_batch(Vec::new())?;
            }
            break;
        }

        Ok(summary)
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn image_fetcher(&self) -> &I {
        &self.image_fetcher
    }

    pub fn image_fetcher_mut(&mut self) -> &mut I {
        &mut self.image_fetcher
    }

    pub fn directions(&self) -> &D {
        &self.directions
    }

    pub fn directions_mut(&mut self) -> &mut D {
        &mut self.directions
    }

    pub fn scene_log(&self) -> &SceneMutationLog {
        &self.scene_log
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Current user-facing status
    pub fn status(&self) -> SessionStatus {
        let session = self.scene_log.session();
        SessionStatus {
            tracking_state: self.tracking_state,
            placed_billboards: session.active_billboard_node_ids.len(),
            route_nodes: session.active_route_node_ids.len(),
            pending_images: self.pending_images.len(),
            navigating: self.navigation.is_some(),
            message: self.message.clone(),
        }
    }

    fn drain_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle(event);
            processed += 1;
        }
        processed
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PoseUpdated(pose) => self.on_pose(pose),
            SessionEvent::LocationUpdated(location) => self.on_location(location),
            SessionEvent::PhotosChanged(photos) => self.on_photos(photos),
            SessionEvent::ImageFetched { photo_id, image_bytes } => {
                self.pending_images.remove(&photo_id);
                if self.photos.iter().any(|photo| photo.id == photo_id) {
                    debug!("Image for photo {} arrived ({} bytes)", photo_id, image_bytes.len());
                    self.image_cache.insert(photo_id, image_bytes);
                    self.billboards_dirty = true;
                } else {
                    debug!("Dropping image for removed photo {}", photo_id);
                }
            }
            SessionEvent::ImageFetchFailed { photo_id, reason } => {
                // forgotten here, so the next redraw asks again
                self.pending_images.remove(&photo_id);
                let error = CollaboratorError::ImageUnavailable { photo_id, reason };
                warn!("{}", error);
            }
            SessionEvent::NavigationTargetSet { destination } => {
                if let Err(error) = DataValidator::validate_geo_point(&destination) {
                    self.reporter.report(error);
                    return;
                }
                info!(
                    "Navigating to ({:.6}, {:.6})",
                    destination.latitude, destination.longitude
                );
                self.navigation = Some(Navigation {
                    destination,
                    waypoints: None,
                    active_request: None,
                });
                self.route_dirty = true;
                self.request_route();
            }
            SessionEvent::NavigationCleared => {
                if self.navigation.take().is_some() {
                    info!("Navigation cleared");
                    self.route_dirty = true;
                }
            }
            SessionEvent::RouteComputed { request_id, result } => {
                self.on_route_computed(request_id, result)
            }
            SessionEvent::SessionReset => self.on_reset(),
        }
    }

    fn on_pose(&mut self, pose: DevicePose) {
        if self.tracking_state != Some(pose.tracking_state) {
            info!("{}", pose.tracking_state.description());
            self.tracking_state = Some(pose.tracking_state);
            self.message = pose.tracking_state.description().to_string();
        }

        if self.pose.is_none() {
            // first pose in this tracking frame
            self.frame_epoch = self.scene_log.reset_epoch();
            self.billboards_dirty = true;
            self.route_dirty = self.navigation.is_some() || self.route_dirty;
        }
        self.pose = Some(pose);
    }

    fn on_location(&mut self, location: UserLocation) {
        if let Err(error) = DataValidator::validate_geo_point(&location.geo_location) {
            self.reporter.report(error);
            return;
        }
        self.user_location = Some(location);

        let moved = match self.last_redraw_location {
            Some(previous) => geodesy::distance(&previous, &location.geo_location),
            None => f64::INFINITY,
        };
        if moved < self.config.redraw_threshold_m {
            return;
        }

        debug!("User moved {:.1} m, redrawing", moved);
        self.last_redraw_location = Some(location.geo_location);
        self.billboards_dirty = true;
        if self.navigation.is_some() {
            self.route_dirty = true;
            self.request_route();
        }
    }

    fn on_photos(&mut self, photos: Vec<CapturedPhoto>) {
        let ids: HashSet<&str> = photos.iter().map(|photo| photo.id.as_str()).collect();
        self.image_cache.retain(|photo_id, _| ids.contains(photo_id.as_str()));
        self.pending_images.retain(|photo_id| ids.contains(photo_id.as_str()));

        info!("Photo collection changed: {} photos", photos.len());
        self.photos = photos;
        self.billboards_dirty = true;
    }

    fn on_route_computed(
        &mut self,
        request_id: RouteRequestId,
        result: Result<Vec<GeoPoint>, CollaboratorError>,
    ) {
        let navigation = match self.navigation.as_mut() {
            Some(navigation) if navigation.active_request == Some(request_id) => navigation,
            _ => {
                warn!("Discarding superseded route result {}", request_id.id());
                return;
            }
        };
        navigation.active_request = None;

        match result {
            Ok(waypoints) if waypoints.is_empty() => {
                self.reporter.report(PlacementError::RouteComputationFailed {
                    reason: "empty route".to_string(),
                });
            }
            Ok(waypoints) => {
                let invalid = waypoints
                    .iter()
                    .find_map(|waypoint| DataValidator::validate_geo_point(waypoint).err());
                match invalid {
                    Some(error) => {
                        self.reporter.report(error);
                        self.reporter.report(PlacementError::RouteComputationFailed {
                            reason: "route contains invalid waypoints".to_string(),
                        });
                    }
                    None => {
                        debug!("Route {} has {} waypoints", request_id.id(), waypoints.len());
                        navigation.waypoints = Some(waypoints);
                        self.route_dirty = true;
                    }
                }
            }
            Err(error) => {
                self.reporter.report(PlacementError::RouteComputationFailed {
                    reason: error.to_string(),
                });
            }
        }
    }

    fn on_reset(&mut self) {
        let clears = self.scene_log.reset();
        self.pending_clears.extend(clears);
        self.pose = None;
        self.billboards_dirty = true;
        self.route_dirty = true;
        self.message = "Tracking frame reset".to_string();
    }

    /// Issue a directions request from the current location; any earlier
    /// request in flight is superseded.
    fn request_route(&mut self) {
        let (navigation, user) = match (self.navigation.as_mut(), self.user_location) {
            (Some(navigation), Some(user)) => (navigation, user),
            _ => return,
        };

        self.route_request_counter += 1;
        let request = RouteRequest {
            request_id: RouteRequestId::new(self.route_request_counter),
            from: user.geo_location,
            to: navigation.destination,
        };
        navigation.active_request = Some(request.request_id);
        debug!("Requesting walking route {}", request.request_id.id());

        let reply = EventSender::new(self.event_tx.clone());
        if let Err(error) = self.directions.request_walking_route(request, reply) {
            navigation.active_request = None;
            self.reporter.report(PlacementError::RouteComputationFailed {
                reason: error.to_string(),
            });
        }
    }

    fn needs_reconciliation(&self) -> bool {
        (self.billboards_dirty || self.route_dirty)
            && self.pose.is_some()
            && self.user_location.is_some()
    }

    /// One reconciliation pass over the dirty categories
    fn reconcile(&mut self) -> ApiResult<usize> {
        let (camera_pose, user) = match (self.pose, self.user_location) {
            (Some(pose), Some(location)) => (pose.world_transform, location.geo_location),
            _ => return Ok(0),
        };

        let mut commands = Vec::new();
        if self.billboards_dirty {
            self.billboards_dirty = false;
            commands.extend(self.reconcile_billboards(&camera_pose, &user));
        }
        if self.route_dirty {
            self.route_dirty = false;
            commands.extend(self.reconcile_route(&camera_pose, &user));
        }

        self.apply_batch(commands)
    }

    fn reconcile_billboards(&mut self, camera_pose: &Transform4, user: &GeoPoint) -> Vec<PlacementCommand> {
        let outcome = self.engine.place(&self.photos, user, camera_pose, &self.image_cache);

        for error in outcome.errors.iter().cloned() {
            self.reporter.report(error);
        }
        for photo_id in &outcome.awaiting_images {
            self.request_image(photo_id);
        }

        let placed = outcome.placements.len();
        if placed > 0 {
            self.message = format!("{} AR images placed", placed);
        } else {
            self.message = "Image not placed".to_string();
        }

        match self.scene_log.reconcile_billboards(self.frame_epoch, &outcome.placements) {
            Ok(commands) => commands,
            Err(error) => {
                self.reporter.report(error);
                Vec::new()
            }
        }
    }

    fn reconcile_route(&mut self, camera_pose: &Transform4, user: &GeoPoint) -> Vec<PlacementCommand> {
        let route_commands = match &self.navigation {
            Some(Navigation { destination, waypoints: Some(waypoints), .. }) => {
                match self.projector.project(camera_pose, user, waypoints, destination) {
                    Ok(commands) => commands,
                    Err(error) => {
                        self.reporter.report(error);
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        match self.scene_log.replace_route(self.frame_epoch, route_commands) {
            Ok(commands) => commands,
            Err(error) => {
                self.reporter.report(error);
                Vec::new()
            }
        }
    }

    fn request_image(&mut self, photo_id: &str) {
        if self.pending_images.contains(photo_id) {
            return;
        }

        self.reporter.report(PlacementError::MissingImageData {
            photo_id: photo_id.to_string(),
        });
        let reply = EventSender::new(self.event_tx.clone());
        match self.image_fetcher.request_full_image(photo_id, reply) {
            Ok(()) => {
                self.pending_images.insert(photo_id.to_string());
            }
            Err(error) => warn!("Could not request image for photo {}: {}", photo_id, error),
        }
    }

    /// Send one batch to the sink, prefixed by any clears still owed to it
    fn apply_batch(&mut self, commands: Vec<PlacementCommand>) -> ApiResult<usize> {
        let mut batch = std::mem::take(&mut self.pending_clears);
        batch.extend(commands);
        if batch.is_empty() {
            return Ok(0);
        }

        match self.sink.apply(&batch) {
            Ok(()) => {
                debug!("Applied {} commands", batch.len());
                Ok(batch.len())
            }
            Err(error) => {
                warn!(
                    "Scene sink rejected {} commands: {} ({:?})",
                    batch.len(),
                    error,
                    error.recovery_strategy()
                );
                // scene contents unknown: owe the sink both clears and rebuild
                self.pending_clears = self.scene_log.reset();
                if self.pose.is_some() {
                    self.frame_epoch = self.scene_log.reset_epoch();
                }
                self.billboards_dirty = true;
                self.route_dirty = true;
                Err(error.into())
            }
        }
    }
}
