//! Scene mutation log
//!
//! Tracks which nodes have been emitted per category and turns fresh
//! placement results into the minimal command batch: billboards are diffed by
//! node id, route geometry is always cleared and rebuilt wholesale. Every
//! batch is tagged with the tracking-frame epoch it was computed in; batches
//! from before the latest reset are refused.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::algorithms::placement::BillboardPlacement;
use crate::api::types::{NodeCategory, PlacementCommand};
use crate::validation::PlacementError;

/// Node ids currently present in the scene, per category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementSession {
    pub active_billboard_node_ids: BTreeSet<String>,
    pub active_route_node_ids: BTreeSet<String>,
}

impl PlacementSession {
    pub fn is_empty(&self) -> bool {
        self.active_billboard_node_ids.is_empty() && self.active_route_node_ids.is_empty()
    }
}

/// Idempotent reconciliation between computed placements and the scene
#[derive(Debug, Default)]
pub struct SceneMutationLog {
    session: PlacementSession,
    /// Last add command emitted for each billboard node
    emitted_billboards: BTreeMap<String, PlacementCommand>,
    reset_epoch: u64,
    needs_full_regeneration: bool,
}

impl SceneMutationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &PlacementSession {
        &self.session
    }

    /// Tracking-frame epoch; advanced by every reset
    pub fn reset_epoch(&self) -> u64 {
        self.reset_epoch
    }

    /// Whether a reset happened and nothing has been rebuilt since
    pub fn needs_full_regeneration(&self) -> bool {
        self.needs_full_regeneration
    }

    /// Diff new billboard placements against the tracked set.
    ///
    /// Removes for dropped ids come first, then adds for new or changed ids.
    /// Unchanged billboards produce no command.
    pub fn reconcile_billboards(
        &mut self,
        frame_epoch: u64,
        placements: &[BillboardPlacement],
    ) -> Result<Vec<PlacementCommand>, PlacementError> {
        self.check_epoch(frame_epoch)?;

        let fresh: BTreeMap<String, PlacementCommand> = placements
            .iter()
            .map(|placement| (placement.node_id.clone(), placement.to_command()))
            .collect();

        let mut commands = Vec::new();
        for node_id in self.emitted_billboards.keys() {
            if !fresh.contains_key(node_id) {
                debug!("Retracting {}", node_id);
                commands.push(PlacementCommand::RemoveNode { node_id: node_id.clone() });
            }
        }
        for placement in placements {
            let command = &fresh[&placement.node_id];
            if self.emitted_billboards.get(&placement.node_id) != Some(command) {
                debug!("Placing {} at {:.1} m", placement.node_id, placement.distance_m);
                commands.push(command.clone());
            }
        }

        self.session.active_billboard_node_ids = fresh.keys().cloned().collect();
        self.emitted_billboards = fresh;
        self.needs_full_regeneration = false;
        Ok(commands)
    }

    /// Clear the route category and replace it with `route_commands`.
    pub fn replace_route(
        &mut self,
        frame_epoch: u64,
        route_commands: Vec<PlacementCommand>,
    ) -> Result<Vec<PlacementCommand>, PlacementError> {
        self.check_epoch(frame_epoch)?;

        self.session.active_route_node_ids = route_commands
            .iter()
            .filter_map(|command| command.node_id().map(str::to_string))
            .collect();

        let mut commands = Vec::with_capacity(route_commands.len() + 1);
        commands.push(PlacementCommand::ClearCategory { category: NodeCategory::Route });
        commands.extend(route_commands);
        Ok(commands)
    }

    /// Forget everything after the tracking frame was reset.
    ///
    /// Returns the clears for both categories and bumps the epoch so that
    /// results computed in the old frame can no longer be applied.
    pub fn reset(&mut self) -> Vec<PlacementCommand> {
        info!(
            "Tracking frame reset: dropping {} billboards and {} route nodes",
            self.session.active_billboard_node_ids.len(),
            self.session.active_route_node_ids.len()
        );

        self.session = PlacementSession::default();
        self.emitted_billboards.clear();
        self.reset_epoch += 1;
        self.needs_full_regeneration = true;

        vec![
            PlacementCommand::ClearCategory { category: NodeCategory::Billboards },
            PlacementCommand::ClearCategory { category: NodeCategory::Route },
        ]
    }

    fn check_epoch(&self, frame_epoch: u64) -> Result<(), PlacementError> {
        if frame_epoch == self.reset_epoch {
            Ok(())
        } else {
            Err(PlacementError::StaleSessionReference { reset_epoch: self.reset_epoch })
        }
    }
}
