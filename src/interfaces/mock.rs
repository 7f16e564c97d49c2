//! In-memory collaborators for testing and development

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::api::types::{NodeCategory, PlacementCommand, RouteRequest, RouteRequestId, SessionEvent};
use crate::core::GeoPoint;
use crate::interfaces::{
    CollabResult, CollaboratorError, DirectionsService, EventSender, ImageFetcher, SceneSink,
};

/// Scene sink that records every batch and mirrors the resulting node set
#[derive(Debug, Default)]
pub struct RecordingSceneSink {
    batches: Vec<Vec<PlacementCommand>>,
    live_nodes: BTreeMap<String, PlacementCommand>,
    reject_next: Option<CollaboratorError>,
}

impl RecordingSceneSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `apply` call fail with `SinkRejected`
    pub fn fail_next_batch(&mut self, details: &str) {
        self.fail_next_batch_with(CollaboratorError::SinkRejected {
            details: details.to_string(),
        });
    }

    /// Make the next `apply` call fail with the given error
    pub fn fail_next_batch_with(&mut self, error: CollaboratorError) {
        self.reject_next = Some(error);
    }

    pub fn batches(&self) -> &[Vec<PlacementCommand>] {
        &self.batches
    }

    pub fn last_batch(&self) -> Option<&[PlacementCommand]> {
        self.batches.last().map(Vec::as_slice)
    }

    pub fn all_commands(&self) -> impl Iterator<Item = &PlacementCommand> {
        self.batches.iter().flatten()
    }

    pub fn clear_history(&mut self) {
        self.batches.clear();
    }

    /// Ids of the nodes currently in the mirrored scene, sorted
    pub fn live_node_ids(&self) -> Vec<String> {
        self.live_nodes.keys().cloned().collect()
    }

    pub fn live_node(&self, node_id: &str) -> Option<&PlacementCommand> {
        self.live_nodes.get(node_id)
    }

    pub fn live_count(&self, category: NodeCategory) -> usize {
        self.live_nodes
            .values()
            .filter(|command| command.added_category() == Some(category))
            .count()
    }
}

impl SceneSink for RecordingSceneSink {
    fn apply(&mut self, commands: &[PlacementCommand]) -> CollabResult<()> {
        if let Some(error) = self.reject_next.take() {
            return Err(error);
        }

        for command in commands {
            match command {
                PlacementCommand::RemoveNode { node_id } => {
                    self.live_nodes.remove(node_id);
                }
                PlacementCommand::ClearCategory { category } => {
                    self.live_nodes
                        .retain(|_, node| node.added_category() != Some(*category));
                }
                add => {
                    if let Some(node_id) = add.node_id() {
                        self.live_nodes.insert(node_id.to_string(), add.clone());
                    }
                }
            }
        }

        self.batches.push(commands.to_vec());
        Ok(())
    }
}

/// Image fetcher backed by an in-memory library
#[derive(Debug, Default)]
pub struct MockImageFetcher {
    library: HashMap<String, Vec<u8>>,
    requests: Vec<String>,
    queued: VecDeque<(String, EventSender)>,
    respond_immediately: bool,
}

impl MockImageFetcher {
    /// Fetcher that holds replies until `deliver_all`
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher that replies from inside `request_full_image`
    pub fn immediate() -> Self {
        Self {
            respond_immediately: true,
            ..Self::default()
        }
    }

    pub fn insert_image(&mut self, photo_id: &str, image_bytes: Vec<u8>) {
        self.library.insert(photo_id.to_string(), image_bytes);
    }

    /// Every photo id requested so far, in order
    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    pub fn pending_count(&self) -> usize {
        self.queued.len()
    }

    /// Deliver all held replies; returns how many were sent
    pub fn deliver_all(&mut self) -> CollabResult<usize> {
        let mut delivered = 0;
        while let Some((photo_id, reply)) = self.queued.pop_front() {
            self.respond(&photo_id, &reply)?;
            delivered += 1;
        }
        Ok(delivered)
    }

    fn respond(&self, photo_id: &str, reply: &EventSender) -> CollabResult<()> {
        let event = match self.library.get(photo_id) {
            Some(bytes) => SessionEvent::ImageFetched {
                photo_id: photo_id.to_string(),
                image_bytes: bytes.clone(),
            },
            None => SessionEvent::ImageFetchFailed {
                photo_id: photo_id.to_string(),
                reason: "not found".to_string(),
            },
        };
        reply.send(event)
    }
}

impl ImageFetcher for MockImageFetcher {
    fn request_full_image(&mut self, photo_id: &str, reply: EventSender) -> CollabResult<()> {
        self.requests.push(photo_id.to_string());
        if self.respond_immediately {
            self.respond(photo_id, &reply)
        } else {
            self.queued.push_back((photo_id.to_string(), reply));
            Ok(())
        }
    }
}

/// Directions service answering every request with one configured route
#[derive(Debug, Default)]
pub struct MockDirectionsService {
    route: Option<Vec<GeoPoint>>,
    requests: Vec<RouteRequest>,
    queued: VecDeque<(RouteRequest, EventSender)>,
    respond_immediately: bool,
}

impl MockDirectionsService {
    /// Service that holds replies until completed explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// Service that replies from inside `request_walking_route`
    pub fn immediate() -> Self {
        Self {
            respond_immediately: true,
            ..Self::default()
        }
    }

    /// Waypoints returned for subsequent replies; `None` makes them fail
    pub fn set_route(&mut self, route: Option<Vec<GeoPoint>>) {
        self.route = route;
    }

    pub fn requests(&self) -> &[RouteRequest] {
        &self.requests
    }

    pub fn pending_count(&self) -> usize {
        self.queued.len()
    }

    /// Answer one held request, whichever position it has in the queue
    pub fn complete(&mut self, request_id: RouteRequestId) -> CollabResult<bool> {
        match self.queued.iter().position(|(request, _)| request.request_id == request_id) {
            Some(index) => {
                if let Some((request, reply)) = self.queued.remove(index) {
                    self.respond(&request, &reply)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Answer all held requests in the order they were issued
    pub fn complete_all(&mut self) -> CollabResult<usize> {
        let mut delivered = 0;
        while let Some((request, reply)) = self.queued.pop_front() {
            self.respond(&request, &reply)?;
            delivered += 1;
        }
        Ok(delivered)
    }

    fn respond(&self, request: &RouteRequest, reply: &EventSender) -> CollabResult<()> {
        let result = match &self.route {
            Some(waypoints) => Ok(waypoints.clone()),
            None => Err(CollaboratorError::RouteUnavailable {
                reason: "no walking route found".to_string(),
            }),
        };
        reply.send(SessionEvent::RouteComputed {
            request_id: request.request_id,
            result,
        })
    }
}

impl DirectionsService for MockDirectionsService {
    fn request_walking_route(&mut self, request: RouteRequest, reply: EventSender) -> CollabResult<()> {
        self.requests.push(request.clone());
        if self.respond_immediately {
            self.respond(&request, &reply)
        } else {
            self.queued.push_back((request, reply));
            Ok(())
        }
    }
}
