//! Step-indexed task sequences.
//!
//! A store or ship task is a strict ordered list of sub-steps, each
//! gated on a wait condition (arrived, oriented, mast settled, store
//! reply). `advance` runs at most one step transition per tick, so a
//! sequence suspends cleanly at every gate and never blocks the loop.
//!
//! Completion and failure are reported to the orchestrator over a
//! channel, processed at the start of its next tick.

use crate::core::{ParcelId, Point3, RobotId, SlotId};
use crate::fleet::robot::Robot;
use crate::fleet::task::AssignmentMaps;
use crate::planning::{PathPlanner, PathRequestQueue, PlanError, PlannedPath};
use crate::sensing::{ObstacleSampler, SteerDecision, SteeringEngine};
use crate::world::store::{parse_tag, ParcelRecord, SlotRecord, WarehouseStore};
use crate::world::WorldView;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

/// Standoff distance of approach poses from their target (meters).
const APPROACH_STANDOFF: f32 = 0.8;
/// Arrival tolerance for waypoints and goals (meters).
const ARRIVE_TOLERANCE: f32 = 0.3;
/// Orientation tolerance (radians).
const ORIENT_TOLERANCE: f32 = 0.05;
/// Mast settle tolerance (meters).
const MAST_TOLERANCE: f32 = 0.02;
/// Transport height of the mast while carrying (meters).
const CARRY_HEIGHT: f32 = 1.2;
/// Drop height at the conveyor (meters).
const DROP_HEIGHT: f32 = 0.3;
/// How far the robot backs off after placing a parcel (meters).
const RETREAT_DISTANCE: f32 = 0.8;
/// Carrier-forward offset applied when releasing a payload.
const RELEASE_OFFSET: Point3 = Point3 {
    x: 0.3,
    y: 0.0,
    z: 0.0,
};
/// Where an aborted payload is set down relative to home.
const ABORT_STAGING_OFFSET: Point3 = Point3 {
    x: 0.6,
    y: 0.0,
    z: 0.6,
};
/// Store write attempts before the sequence gives up.
const PERSIST_MAX_RETRIES: u32 = 3;
/// Lookahead distance of steering avoidance targets (meters).
const STEER_LOOKAHEAD: f32 = 1.0;

/// Message from a task sequence back to the orchestrator.
#[derive(Debug, Clone)]
pub enum TaskMessage {
    Completed { robot: RobotId },
    Failed { robot: RobotId, reason: String },
}

/// Result of advancing a sequence one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqStatus {
    InProgress,
    Done,
    Aborted,
}

// ============================================================
// Navigation driver
// ============================================================

enum NavPhase {
    Inactive,
    AwaitingPath(Receiver<Result<PlannedPath, PlanError>>),
    Driving,
    Stopped { resume_in: f32 },
    Arrived,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavStatus {
    Pending,
    Arrived,
    Failed,
}

/// Drives the rig along a planned path, with reactive obstacle steering
/// layered on top of waypoint following.
struct NavDrive {
    phase: NavPhase,
    waypoints: Vec<Point3>,
    next: usize,
    goal: Point3,
}

impl NavDrive {
    fn new() -> Self {
        Self {
            phase: NavPhase::Inactive,
            waypoints: Vec::new(),
            next: 0,
            goal: Point3::ZERO,
        }
    }

    fn active(&self) -> bool {
        !matches!(self.phase, NavPhase::Inactive)
    }

    fn reset(&mut self) {
        self.phase = NavPhase::Inactive;
        self.waypoints.clear();
        self.next = 0;
    }

    /// Request a path and begin driving once it arrives.
    fn start<P: PathPlanner>(&mut self, start: Point3, goal: Point3, paths: &mut PathRequestQueue<P>) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        paths.request(
            start,
            goal,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        self.goal = goal;
        self.waypoints.clear();
        self.next = 0;
        self.phase = NavPhase::AwaitingPath(rx);
    }

    fn tick(
        &mut self,
        view: &mut WorldView,
        sampler: &mut ObstacleSampler,
        steering: &mut SteeringEngine,
        dt: f32,
    ) -> NavStatus {
        match &mut self.phase {
            NavPhase::Inactive => NavStatus::Pending,
            NavPhase::AwaitingPath(rx) => {
                match rx.try_recv() {
                    Ok(Ok(path)) => {
                        self.waypoints = path.waypoints;
                        // The goal itself is usually off the cell center
                        self.waypoints.push(self.goal);
                        self.next = 0;
                        self.phase = NavPhase::Driving;
                    }
                    Ok(Err(e)) => {
                        debug!(error = %e, "navigation path request failed");
                        self.phase = NavPhase::Failed;
                        return NavStatus::Failed;
                    }
                    Err(_) => {} // still queued
                }
                NavStatus::Pending
            }
            NavPhase::Driving => {
                let position = view.rig.position();

                while self.next < self.waypoints.len()
                    && position.distance_xz(&self.waypoints[self.next]) <= ARRIVE_TOLERANCE
                {
                    self.next += 1;
                }
                if self.next >= self.waypoints.len() {
                    view.rig.halt();
                    self.phase = NavPhase::Arrived;
                    return NavStatus::Arrived;
                }

                let profile = sampler.sweep(view.sensors, position, view.rig.yaw());
                match steering.decide(&profile) {
                    SteerDecision::Stop { resume_after } => {
                        view.rig.halt();
                        self.phase = NavPhase::Stopped {
                            resume_in: resume_after.as_secs_f32(),
                        };
                    }
                    SteerDecision::Steer { heading_deg, .. } => {
                        // Sensor frame 90 is straight ahead
                        let world_dir = view.rig.yaw() + (heading_deg - 90.0).to_radians();
                        let target = Point3::new(
                            position.x + world_dir.cos() * STEER_LOOKAHEAD,
                            position.y,
                            position.z + world_dir.sin() * STEER_LOOKAHEAD,
                        );
                        view.rig.command_move(target);
                    }
                    SteerDecision::Clear => {
                        steering.reset_heading();
                        view.rig.command_move(self.waypoints[self.next]);
                    }
                }
                NavStatus::Pending
            }
            NavPhase::Stopped { resume_in } => {
                *resume_in -= dt;
                if *resume_in <= 0.0 {
                    self.phase = NavPhase::Driving;
                }
                NavStatus::Pending
            }
            NavPhase::Arrived => NavStatus::Arrived,
            NavPhase::Failed => NavStatus::Failed,
        }
    }
}

// ============================================================
// Task steps
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreStep {
    ApproachSource,
    OrientToSource,
    ReadTag,
    MastToGrasp,
    Attach,
    MastToCarry,
    FindSlot,
    ApproachSlot,
    OrientToSlot,
    MastToPlace,
    Detach,
    Persist,
    Retreat,
    MastHome,
    ReturnHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShipStep {
    ApproachSlot,
    OrientToSlot,
    MastToLift,
    Attach,
    MastToCarry,
    ApproachDrop,
    OrientToDrop,
    MastToDrop,
    Detach,
    Persist,
    Retreat,
    MastHome,
    ReturnHome,
}

enum SeqKind {
    Store {
        step: StoreStep,
        parcel: ParcelRecord,
        category: String,
        slot: Option<SlotRecord>,
    },
    Ship {
        step: ShipStep,
        slot: SlotId,
        slot_position: Point3,
        drop: Point3,
        parcel: Option<ParcelId>,
    },
    /// Post-abort: return home still carrying the payload.
    AbortReturn,
    /// Post-abort: set the payload down at the home staging offset.
    AbortRelease,
}

/// One robot's in-flight task.
pub struct TaskSequence {
    robot_id: RobotId,
    kind: SeqKind,
    nav: NavDrive,
    sampler: ObstacleSampler,
    steering: SteeringEngine,
    completions: Sender<TaskMessage>,
    persist_retries: u32,
    retreat_target: Option<Point3>,
    abort_reason: Option<String>,
}

impl TaskSequence {
    pub fn store(
        robot_id: RobotId,
        parcel: ParcelRecord,
        sampler: ObstacleSampler,
        steering: SteeringEngine,
        completions: Sender<TaskMessage>,
    ) -> Self {
        let category = parcel.category.clone();
        Self {
            robot_id,
            kind: SeqKind::Store {
                step: StoreStep::ApproachSource,
                parcel,
                category,
                slot: None,
            },
            nav: NavDrive::new(),
            sampler,
            steering,
            completions,
            persist_retries: 0,
            retreat_target: None,
            abort_reason: None,
        }
    }

    pub fn ship(
        robot_id: RobotId,
        slot: SlotId,
        slot_position: Point3,
        drop: Point3,
        sampler: ObstacleSampler,
        steering: SteeringEngine,
        completions: Sender<TaskMessage>,
    ) -> Self {
        Self {
            robot_id,
            kind: SeqKind::Ship {
                step: ShipStep::ApproachSlot,
                slot,
                slot_position,
                drop,
                parcel: None,
            },
            nav: NavDrive::new(),
            sampler,
            steering,
            completions,
            persist_retries: 0,
            retreat_target: None,
            abort_reason: None,
        }
    }

    /// Advance the sequence by at most one step transition.
    pub fn advance<P: PathPlanner>(
        &mut self,
        robot: &mut Robot,
        view: &mut WorldView,
        store: &mut dyn WarehouseStore,
        paths: &mut PathRequestQueue<P>,
        maps: &mut AssignmentMaps,
        dt: f32,
    ) -> SeqStatus {
        match &self.kind {
            SeqKind::Store { .. } => self.advance_store(robot, view, store, paths, maps, dt),
            SeqKind::Ship { .. } => self.advance_ship(robot, view, store, paths, dt),
            SeqKind::AbortReturn => self.advance_abort_return(robot, view, paths, dt),
            SeqKind::AbortRelease => self.advance_abort_release(view),
        }
    }

    // --------------------------------------------------------
    // Store task
    // --------------------------------------------------------

    fn advance_store<P: PathPlanner>(
        &mut self,
        robot: &mut Robot,
        view: &mut WorldView,
        store: &mut dyn WarehouseStore,
        paths: &mut PathRequestQueue<P>,
        maps: &mut AssignmentMaps,
        dt: f32,
    ) -> SeqStatus {
        let SeqKind::Store {
            step,
            parcel,
            category,
            slot,
        } = &mut self.kind
        else {
            return SeqStatus::InProgress;
        };
        let step_now = *step;

        match step_now {
            StoreStep::ApproachSource => {
                let target = parcel.position;
                match Self::navigate_to(
                    &mut self.nav,
                    &mut self.sampler,
                    &mut self.steering,
                    robot,
                    view,
                    paths,
                    target,
                    APPROACH_STANDOFF,
                    dt,
                ) {
                    NavStatus::Arrived => {
                        self.nav.reset();
                        *step = StoreStep::OrientToSource;
                    }
                    NavStatus::Failed => {
                        return self.abort(robot, view, "no path to parcel source");
                    }
                    NavStatus::Pending => {}
                }
            }
            StoreStep::OrientToSource => {
                let bearing = view.rig.position().bearing_to(&parcel.position);
                view.rig.command_orient(bearing);
                if view.rig.oriented(ORIENT_TOLERANCE) {
                    *step = StoreStep::ReadTag;
                }
            }
            StoreStep::ReadTag => match store.read_tag(parcel.position) {
                Ok(payload) => match parse_tag(&payload) {
                    Ok(tag) => {
                        debug!(robot = self.robot_id, category = %tag.category, "tag read");
                        *category = tag.category;
                        *step = StoreStep::MastToGrasp;
                    }
                    Err(e) => {
                        warn!(robot = self.robot_id, error = %e, "malformed tag");
                        return self.abort(robot, view, "malformed tag payload");
                    }
                },
                Err(e) => {
                    warn!(robot = self.robot_id, error = %e, "tag read failed");
                    return self.abort(robot, view, "parcel not located");
                }
            },
            StoreStep::MastToGrasp => {
                view.rig.command_mast(parcel.position.y);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = StoreStep::Attach;
                }
            }
            StoreStep::Attach => {
                view.rig.attach_payload(parcel.id);
                *step = StoreStep::MastToCarry;
            }
            StoreStep::MastToCarry => {
                view.rig.command_mast(CARRY_HEIGHT);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = StoreStep::FindSlot;
                }
            }
            StoreStep::FindSlot => match store.find_free_slot(category) {
                Ok(Some(found)) => {
                    if maps.is_slot_claimed(found.id) {
                        // Another robot holds this slot until its store
                        // write lands; once it reads occupied, first-fit
                        // moves on to the next free slot of the category.
                        debug!(
                            robot = self.robot_id,
                            slot = found.id,
                            "first free slot claimed elsewhere, waiting"
                        );
                        return SeqStatus::InProgress;
                    }
                    maps.claim_slot(found.id, self.robot_id);
                    info!(
                        robot = self.robot_id,
                        slot = found.id,
                        category = %category,
                        "destination slot reserved"
                    );
                    *slot = Some(found);
                    *step = StoreStep::ApproachSlot;
                }
                Ok(None) => {
                    return self.abort(robot, view, "no free slot for category");
                }
                Err(e) => {
                    warn!(robot = self.robot_id, error = %e, "slot query failed");
                    self.persist_retries += 1;
                    if self.persist_retries > PERSIST_MAX_RETRIES {
                        return self.abort(robot, view, "store unavailable during slot query");
                    }
                }
            },
            StoreStep::ApproachSlot => {
                let Some(slot) = slot.as_ref() else {
                    return self.abort(robot, view, "slot missing");
                };
                let target = slot.position;
                match Self::navigate_to(
                    &mut self.nav,
                    &mut self.sampler,
                    &mut self.steering,
                    robot,
                    view,
                    paths,
                    target,
                    APPROACH_STANDOFF,
                    dt,
                ) {
                    NavStatus::Arrived => {
                        self.nav.reset();
                        *step = StoreStep::OrientToSlot;
                    }
                    NavStatus::Failed => {
                        return self.abort(robot, view, "no path to slot");
                    }
                    NavStatus::Pending => {}
                }
            }
            StoreStep::OrientToSlot => {
                let Some(slot) = slot.as_ref() else {
                    return self.abort(robot, view, "slot missing");
                };
                let bearing = view.rig.position().bearing_to(&slot.position);
                view.rig.command_orient(bearing);
                if view.rig.oriented(ORIENT_TOLERANCE) {
                    *step = StoreStep::MastToPlace;
                }
            }
            StoreStep::MastToPlace => {
                let Some(slot) = slot.as_ref() else {
                    return self.abort(robot, view, "slot missing");
                };
                view.rig.command_mast(slot.position.y);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = StoreStep::Detach;
                }
            }
            StoreStep::Detach => {
                view.rig.detach_payload(RELEASE_OFFSET);
                self.persist_retries = 0;
                *step = StoreStep::Persist;
            }
            StoreStep::Persist => {
                let Some(slot) = slot.as_ref() else {
                    return self.abort(robot, view, "slot missing");
                };
                match store.store_parcel(parcel.id, slot.id) {
                    Ok(()) => {
                        info!(
                            robot = self.robot_id,
                            parcel = parcel.id,
                            slot = slot.id,
                            "parcel stored"
                        );
                        *step = StoreStep::Retreat;
                    }
                    Err(e) => {
                        warn!(robot = self.robot_id, error = %e, "store write failed, retrying");
                        self.persist_retries += 1;
                        if self.persist_retries > PERSIST_MAX_RETRIES {
                            return self.abort(robot, view, "could not persist parcel location");
                        }
                    }
                }
            }
            StoreStep::Retreat => {
                let anchor = slot.as_ref().map(|s| s.position).unwrap_or(robot.home);
                if self.run_retreat(view, anchor) {
                    // Re-borrow step after the helper call
                    if let SeqKind::Store { step, .. } = &mut self.kind {
                        *step = StoreStep::MastHome;
                    }
                }
                return SeqStatus::InProgress;
            }
            StoreStep::MastHome => {
                view.rig.command_mast(0.0);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = StoreStep::ReturnHome;
                }
            }
            StoreStep::ReturnHome => {
                let home = robot.home;
                match Self::navigate_to(
                    &mut self.nav,
                    &mut self.sampler,
                    &mut self.steering,
                    robot,
                    view,
                    paths,
                    home,
                    0.0,
                    dt,
                ) {
                    NavStatus::Arrived => {
                        return self.complete();
                    }
                    NavStatus::Failed => {
                        return self.abort(robot, view, "no path home");
                    }
                    NavStatus::Pending => {}
                }
            }
        }
        SeqStatus::InProgress
    }

    // --------------------------------------------------------
    // Ship task
    // --------------------------------------------------------

    fn advance_ship<P: PathPlanner>(
        &mut self,
        robot: &mut Robot,
        view: &mut WorldView,
        store: &mut dyn WarehouseStore,
        paths: &mut PathRequestQueue<P>,
        dt: f32,
    ) -> SeqStatus {
        let SeqKind::Ship {
            step,
            slot,
            slot_position,
            drop,
            parcel,
        } = &mut self.kind
        else {
            return SeqStatus::InProgress;
        };
        let step_now = *step;
        let slot_id = *slot;
        let slot_position = *slot_position;
        let drop = *drop;

        match step_now {
            ShipStep::ApproachSlot => {
                match Self::navigate_to(
                    &mut self.nav,
                    &mut self.sampler,
                    &mut self.steering,
                    robot,
                    view,
                    paths,
                    slot_position,
                    APPROACH_STANDOFF,
                    dt,
                ) {
                    NavStatus::Arrived => {
                        self.nav.reset();
                        *step = ShipStep::OrientToSlot;
                    }
                    NavStatus::Failed => {
                        return self.abort(robot, view, "no path to slot");
                    }
                    NavStatus::Pending => {}
                }
            }
            ShipStep::OrientToSlot => {
                let bearing = view.rig.position().bearing_to(&slot_position);
                view.rig.command_orient(bearing);
                if view.rig.oriented(ORIENT_TOLERANCE) {
                    *step = ShipStep::MastToLift;
                }
            }
            ShipStep::MastToLift => {
                view.rig.command_mast(slot_position.y);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = ShipStep::Attach;
                }
            }
            ShipStep::Attach => match store.parcel_at_slot(slot_id) {
                Ok(Some(id)) => {
                    view.rig.attach_payload(id);
                    *parcel = Some(id);
                    *step = ShipStep::MastToCarry;
                }
                Ok(None) => {
                    return self.abort(robot, view, "slot is empty");
                }
                Err(e) => {
                    warn!(robot = self.robot_id, error = %e, "slot content query failed");
                    self.persist_retries += 1;
                    if self.persist_retries > PERSIST_MAX_RETRIES {
                        return self.abort(robot, view, "store unavailable during slot read");
                    }
                }
            },
            ShipStep::MastToCarry => {
                view.rig.command_mast(CARRY_HEIGHT);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = ShipStep::ApproachDrop;
                }
            }
            ShipStep::ApproachDrop => {
                match Self::navigate_to(
                    &mut self.nav,
                    &mut self.sampler,
                    &mut self.steering,
                    robot,
                    view,
                    paths,
                    drop,
                    APPROACH_STANDOFF,
                    dt,
                ) {
                    NavStatus::Arrived => {
                        self.nav.reset();
                        *step = ShipStep::OrientToDrop;
                    }
                    NavStatus::Failed => {
                        return self.abort(robot, view, "no path to conveyor");
                    }
                    NavStatus::Pending => {}
                }
            }
            ShipStep::OrientToDrop => {
                let bearing = view.rig.position().bearing_to(&drop);
                view.rig.command_orient(bearing);
                if view.rig.oriented(ORIENT_TOLERANCE) {
                    *step = ShipStep::MastToDrop;
                }
            }
            ShipStep::MastToDrop => {
                view.rig.command_mast(DROP_HEIGHT);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = ShipStep::Detach;
                }
            }
            ShipStep::Detach => {
                view.rig.detach_payload(RELEASE_OFFSET);
                self.persist_retries = 0;
                *step = ShipStep::Persist;
            }
            ShipStep::Persist => match store.ship_parcel(slot_id) {
                Ok(()) => {
                    info!(robot = self.robot_id, slot = slot_id, "parcel shipped");
                    *step = ShipStep::Retreat;
                }
                Err(e) => {
                    warn!(robot = self.robot_id, error = %e, "ship write failed, retrying");
                    self.persist_retries += 1;
                    if self.persist_retries > PERSIST_MAX_RETRIES {
                        return self.abort(robot, view, "could not persist shipment");
                    }
                }
            },
            ShipStep::Retreat => {
                if self.run_retreat(view, drop) {
                    // Re-borrow step after the helper call
                    if let SeqKind::Ship { step, .. } = &mut self.kind {
                        *step = ShipStep::MastHome;
                    }
                }
                return SeqStatus::InProgress;
            }
            ShipStep::MastHome => {
                view.rig.command_mast(0.0);
                if view.rig.mast_settled(MAST_TOLERANCE) {
                    *step = ShipStep::ReturnHome;
                }
            }
            ShipStep::ReturnHome => {
                let home = robot.home;
                match Self::navigate_to(
                    &mut self.nav,
                    &mut self.sampler,
                    &mut self.steering,
                    robot,
                    view,
                    paths,
                    home,
                    0.0,
                    dt,
                ) {
                    NavStatus::Arrived => {
                        return self.complete();
                    }
                    NavStatus::Failed => {
                        return self.abort(robot, view, "no path home");
                    }
                    NavStatus::Pending => {}
                }
            }
        }
        SeqStatus::InProgress
    }

    // --------------------------------------------------------
    // Abort path
    // --------------------------------------------------------

    /// Abort the remaining sequence. A robot still carrying a payload
    /// first returns home and sets it down at the staging offset; only
    /// then is the failure reported.
    fn abort(&mut self, robot: &mut Robot, view: &mut WorldView, reason: &str) -> SeqStatus {
        warn!(robot = self.robot_id, reason, "task aborted");
        self.abort_reason = Some(reason.to_string());
        self.nav.reset();

        if view.rig.carrying().is_some() {
            robot.destination = robot.home;
            self.kind = SeqKind::AbortReturn;
            SeqStatus::InProgress
        } else {
            self.send_failure();
            SeqStatus::Aborted
        }
    }

    fn advance_abort_return<P: PathPlanner>(
        &mut self,
        robot: &mut Robot,
        view: &mut WorldView,
        paths: &mut PathRequestQueue<P>,
        dt: f32,
    ) -> SeqStatus {
        let home = robot.home;
        match Self::navigate_to(
            &mut self.nav,
            &mut self.sampler,
            &mut self.steering,
            robot,
            view,
            paths,
            home,
            0.0,
            dt,
        ) {
            NavStatus::Arrived => {
                self.nav.reset();
                self.kind = SeqKind::AbortRelease;
                SeqStatus::InProgress
            }
            NavStatus::Failed => {
                // Cannot even get home: set the payload down where we are
                self.kind = SeqKind::AbortRelease;
                SeqStatus::InProgress
            }
            NavStatus::Pending => SeqStatus::InProgress,
        }
    }

    fn advance_abort_release(&mut self, view: &mut WorldView) -> SeqStatus {
        view.rig.command_mast(DROP_HEIGHT);
        if !view.rig.mast_settled(MAST_TOLERANCE) {
            return SeqStatus::InProgress;
        }
        view.rig.detach_payload(ABORT_STAGING_OFFSET);
        view.rig.command_mast(0.0);
        self.send_failure();
        SeqStatus::Aborted
    }

    fn send_failure(&mut self) {
        let reason = self
            .abort_reason
            .take()
            .unwrap_or_else(|| "unspecified".to_string());
        let _ = self.completions.send(TaskMessage::Failed {
            robot: self.robot_id,
            reason,
        });
    }

    fn complete(&mut self) -> SeqStatus {
        let _ = self.completions.send(TaskMessage::Completed {
            robot: self.robot_id,
        });
        SeqStatus::Done
    }

    // --------------------------------------------------------
    // Shared motion helpers
    // --------------------------------------------------------

    /// Drive toward `target`, stopping `standoff` meters short of it.
    /// Starts the path request on first call and records the goal as the
    /// robot's destination.
    #[allow(clippy::too_many_arguments)]
    fn navigate_to<P: PathPlanner>(
        nav: &mut NavDrive,
        sampler: &mut ObstacleSampler,
        steering: &mut SteeringEngine,
        robot: &mut Robot,
        view: &mut WorldView,
        paths: &mut PathRequestQueue<P>,
        target: Point3,
        standoff: f32,
        dt: f32,
    ) -> NavStatus {
        if !nav.active() {
            let position = view.rig.position();
            let goal = position.approach_point(&target, standoff);
            robot.destination = goal;
            nav.start(position, goal, paths);
        }
        nav.tick(view, sampler, steering, dt)
    }

    /// Back away from `anchor` by the retreat distance. True when done.
    fn run_retreat(&mut self, view: &mut WorldView, anchor: Point3) -> bool {
        let position = view.rig.position();
        let target = *self.retreat_target.get_or_insert_with(|| {
            let dx = position.x - anchor.x;
            let dz = position.z - anchor.z;
            let len = (dx * dx + dz * dz).sqrt().max(1e-3);
            Point3::new(
                position.x + dx / len * RETREAT_DISTANCE,
                position.y,
                position.z + dz / len * RETREAT_DISTANCE,
            )
        });

        view.rig.command_move(target);
        if position.distance_xz(&target) <= ARRIVE_TOLERANCE {
            view.rig.halt();
            self.retreat_target = None;
            true
        } else {
            false
        }
    }
}
