//! Fleet orchestration.
//!
//! One orchestrator tick: drain completion messages, localize every
//! robot, run battery and wait bookkeeping, resolve proximity conflicts,
//! poll the store for work on the poll interval, and advance the active
//! task sequences. All fleet state is mutated here and nowhere else.

use crate::config::FleetConfig;
use crate::core::{Point3, RobotId};
use crate::estimation::{Localizer, LocalizerConfig};
use crate::fleet::robot::{Robot, RobotState};
use crate::fleet::sequence::{SeqStatus, TaskMessage, TaskSequence};
use crate::fleet::task::{AssignmentMaps, Task};
use crate::planning::{PathPlanner, PathRequestQueue};
use crate::sensing::steering::SteeringEngineConfig;
use crate::sensing::{ObstacleSampler, SteeringEngine};
use crate::world::store::{RobotTelemetry, WarehouseStore};
use crate::world::FleetWorld;
use crossbeam_channel::{Receiver, Sender};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of one assignment attempt.
enum AssignOutcome {
    /// Task handed to a robot.
    Assigned,
    /// No idle robot or the store write failed; try again next poll.
    Requeue,
    /// Resource already claimed; the task is a duplicate.
    Drop,
}

/// Owns all fleet bookkeeping and drives it once per tick.
pub struct Orchestrator {
    config: FleetConfig,
    robots: Vec<Robot>,
    localizers: Vec<Localizer>,
    estimates: Vec<Point3>,
    sequences: HashMap<RobotId, TaskSequence>,
    maps: AssignmentMaps,
    pending_store: VecDeque<Task>,
    pending_ship: VecDeque<Task>,
    completions_tx: Sender<TaskMessage>,
    completions_rx: Receiver<TaskMessage>,
    conveyor_drops: Vec<Point3>,
    next_drop: usize,
    ticks: u64,
}

impl Orchestrator {
    pub fn new(config: FleetConfig, world: &dyn FleetWorld, conveyor_drops: Vec<Point3>) -> Self {
        let (completions_tx, completions_rx) = crossbeam_channel::unbounded();

        let mut robots = Vec::with_capacity(world.robot_count());
        let mut localizers = Vec::with_capacity(world.robot_count());
        let mut estimates = Vec::with_capacity(world.robot_count());

        for id in 0..world.robot_count() as RobotId {
            let home = world.home_pose(id);
            robots.push(Robot::new(id, home));
            localizers.push(Localizer::new(localizer_config(&config, id), home));
            estimates.push(home);
        }

        Self {
            config,
            robots,
            localizers,
            estimates,
            sequences: HashMap::new(),
            maps: AssignmentMaps::new(),
            pending_store: VecDeque::new(),
            pending_ship: VecDeque::new(),
            completions_tx,
            completions_rx,
            conveyor_drops,
            next_drop: 0,
            ticks: 0,
        }
    }

    pub fn robot(&self, id: RobotId) -> &Robot {
        &self.robots[id as usize]
    }

    pub fn robot_mut(&mut self, id: RobotId) -> &mut Robot {
        &mut self.robots[id as usize]
    }

    pub fn estimate(&self, id: RobotId) -> Point3 {
        self.estimates[id as usize]
    }

    pub fn claim_count(&self) -> usize {
        self.maps.claim_count()
    }

    pub fn pending_task_count(&self) -> usize {
        self.pending_store.len() + self.pending_ship.len()
    }

    /// How many conveyor drop points have been handed out so far.
    pub fn drop_cursor(&self) -> usize {
        self.next_drop
    }

    /// True when every robot is idle and no work is queued or claimed.
    pub fn is_quiescent(&self) -> bool {
        self.robots.iter().all(|r| r.state == RobotState::Idle)
            && self.pending_task_count() == 0
            && self.maps.claim_count() == 0
    }

    /// Run one orchestration tick.
    pub fn tick<P: PathPlanner>(
        &mut self,
        world: &mut dyn FleetWorld,
        store: &mut dyn WarehouseStore,
        paths: &mut PathRequestQueue<P>,
        dt: f32,
    ) {
        self.drain_completions();
        self.localize(world, store);
        self.update_batteries(world, dt);
        self.update_waits(dt);
        self.resolve_proximity_conflicts(world);

        if self.ticks % self.config.orchestrator.poll_interval_ticks as u64 == 0 {
            self.run_assignments(store);
            self.write_telemetry(store);
        }

        self.advance_sequences(world, store, paths, dt);
        self.ticks = self.ticks.wrapping_add(1);
    }

    // --------------------------------------------------------
    // Tick phases
    // --------------------------------------------------------

    /// Process task completion messages from the sequences. Releasing the
    /// claim maps here keeps "robot went idle" and "resources freed" one
    /// atomic transition.
    fn drain_completions(&mut self) {
        let messages: Vec<TaskMessage> = self.completions_rx.try_iter().collect();
        for message in messages {
            let id = match &message {
                TaskMessage::Completed { robot } => {
                    info!(robot, "task completed");
                    *robot
                }
                TaskMessage::Failed { robot, reason } => {
                    warn!(robot, reason = %reason, "task failed");
                    *robot
                }
            };

            self.maps.release_robot(id);
            self.sequences.remove(&id);
            let robot = &mut self.robots[id as usize];
            robot.state = RobotState::Idle;
            robot.saved = None;
            robot.destination = robot.home;
        }
    }

    fn localize(&mut self, world: &mut dyn FleetWorld, store: &dyn WarehouseStore) {
        for (idx, localizer) in self.localizers.iter_mut().enumerate() {
            let view = world.view(idx as RobotId);
            let odometry = view.rig.odometry();
            self.estimates[idx] = localizer.tick(odometry, view.sensors, store);
        }
    }

    /// Drain batteries away from home; trigger and progress recharges.
    fn update_batteries(&mut self, world: &mut dyn FleetWorld, dt: f32) {
        let battery = &self.config.battery;
        let home_tolerance = self.config.orchestrator.home_tolerance;
        let charge_rate = 100.0 / battery.charge_duration_secs;

        for (idx, robot) in self.robots.iter_mut().enumerate() {
            let id = idx as RobotId;

            if robot.state == RobotState::Recharging {
                let view = world.view(id);
                let position = view.rig.position();
                if position.distance_xz(&robot.home) > home_tolerance {
                    view.rig.command_move(robot.home);
                } else {
                    view.rig.halt();
                    robot.battery = (robot.battery + charge_rate * dt).min(100.0);
                    if robot.battery >= 100.0 {
                        robot.resume();
                        info!(robot = id, state = robot.state.as_str(), "recharged, resuming");
                    }
                }
                continue;
            }

            let position = world.rig(id).position();
            if position.distance_xz(&robot.home) > home_tolerance {
                robot.battery = (robot.battery - battery.drain_per_sec * dt).max(0.0);
            }

            if robot.battery < battery.critical_level {
                info!(
                    robot = id,
                    battery = robot.battery,
                    "battery critical, heading home to charge"
                );
                robot.interrupt(RobotState::Recharging);
                world.view(id).rig.halt();
            }
        }
    }

    fn update_waits(&mut self, dt: f32) {
        for robot in &mut self.robots {
            if robot.state == RobotState::Wait {
                robot.wait_remaining -= dt;
                if robot.wait_remaining <= 0.0 {
                    robot.resume();
                    debug!(robot = robot.id, state = robot.state.as_str(), "wait over");
                }
            }
        }
    }

    /// Pause one robot of any too-close working pair. An idle robot is
    /// already stationary, so conflicts act only when both robots are
    /// driving a task; of those, the higher id waits.
    fn resolve_proximity_conflicts(&mut self, world: &mut dyn FleetWorld) {
        let threshold = self.config.orchestrator.proximity_threshold;
        let wait = self.config.orchestrator.wait_duration_secs;

        for a in 0..self.robots.len() {
            for b in (a + 1)..self.robots.len() {
                if self.estimates[a].distance_xz(&self.estimates[b]) >= threshold {
                    continue;
                }
                if !self.robots[a].state.is_working() || !self.robots[b].state.is_working() {
                    continue;
                }

                let waiter = b.max(a);
                let robot = &mut self.robots[waiter];
                debug!(
                    robot = robot.id,
                    other = a.min(b),
                    "proximity conflict, pausing"
                );
                robot.interrupt(RobotState::Wait);
                robot.wait_remaining = wait;
                world.view(waiter as RobotId).rig.halt();
            }
        }
    }

    /// Retry queued tasks (ship first), then pull new work from the store.
    fn run_assignments(&mut self, store: &mut dyn WarehouseStore) {
        self.retry_pending(store);
        self.poll_ship_orders(store);
        self.poll_store_parcels(store);
    }

    fn retry_pending(&mut self, store: &mut dyn WarehouseStore) {
        for shipping in [true, false] {
            let queue = if shipping {
                std::mem::take(&mut self.pending_ship)
            } else {
                std::mem::take(&mut self.pending_store)
            };

            for task in queue {
                match self.try_assign(task, store) {
                    (AssignOutcome::Requeue, Some(task)) => self.requeue(task),
                    _ => {}
                }
            }
        }
    }

    fn poll_ship_orders(&mut self, store: &mut dyn WarehouseStore) {
        let orders = match store.pending_orders() {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "order poll failed");
                return;
            }
        };

        for slot in orders {
            if self.maps.is_slot_claimed(slot.id) {
                continue;
            }
            if self.pending_ship_contains(slot.id) {
                continue;
            }
            let Some(drop) = self.take_drop_point() else {
                warn!("no conveyor drop points configured, cannot ship");
                return;
            };
            let task = Task::Ship {
                slot: slot.id,
                slot_position: slot.position,
                drop,
            };
            if let (AssignOutcome::Requeue, Some(task)) = self.try_assign(task, store) {
                self.requeue(task);
            }
        }
    }

    fn poll_store_parcels(&mut self, store: &mut dyn WarehouseStore) {
        let parcels = match store.pending_parcels() {
            Ok(parcels) => parcels,
            Err(e) => {
                warn!(error = %e, "parcel poll failed");
                return;
            }
        };

        for parcel in parcels {
            if self.maps.is_parcel_claimed(parcel.position) {
                continue;
            }
            if self.pending_store_contains(parcel.position) {
                continue;
            }
            let task = Task::Store { parcel };
            if let (AssignOutcome::Requeue, Some(task)) = self.try_assign(task, store) {
                self.requeue(task);
            }
        }
    }

    /// Try to hand a task to the nearest idle robot. The in-memory
    /// assignment is committed only after the telemetry write confirms
    /// the store accepted it; on failure the claim is rolled back and
    /// the task requeued.
    fn try_assign(
        &mut self,
        task: Task,
        store: &mut dyn WarehouseStore,
    ) -> (AssignOutcome, Option<Task>) {
        match &task {
            Task::Store { parcel } if self.maps.is_parcel_claimed(parcel.position) => {
                return (AssignOutcome::Drop, None);
            }
            Task::Ship { slot, .. } if self.maps.is_slot_claimed(*slot) => {
                return (AssignOutcome::Drop, None);
            }
            _ => {}
        }

        let reference = task.reference_point();
        let nearest = self
            .robots
            .iter()
            .enumerate()
            .filter(|(_, r)| r.state == RobotState::Idle)
            .min_by(|(a, _), (b, _)| {
                let da = self.estimates[*a].distance_xz(&reference);
                let db = self.estimates[*b].distance_xz(&reference);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx);

        let Some(idx) = nearest else {
            return (AssignOutcome::Requeue, Some(task));
        };
        let id = idx as RobotId;

        let next_state = match &task {
            Task::Store { parcel } => {
                self.maps.claim_parcel(parcel.position, id);
                RobotState::Storing
            }
            Task::Ship { slot, .. } => {
                self.maps.claim_slot(*slot, id);
                RobotState::Shipping
            }
        };

        let telemetry = RobotTelemetry {
            position: self.estimates[idx],
            battery: self.robots[idx].battery,
            state: next_state.as_str(),
        };
        if let Err(e) = store.write_telemetry(id, &telemetry) {
            warn!(robot = id, error = %e, "assignment write failed, requeueing");
            match &task {
                Task::Store { parcel } => self.maps.release_parcel(parcel.position),
                Task::Ship { slot, .. } => self.maps.release_slot(*slot),
            }
            return (AssignOutcome::Requeue, Some(task));
        }

        let robot = &mut self.robots[idx];
        robot.state = next_state;
        robot.destination = reference;

        let sampler = self.make_sampler();
        let steering = self.make_steering(id);
        let sequence = match task {
            Task::Store { parcel } => {
                info!(robot = id, parcel = parcel.id, "store task assigned");
                TaskSequence::store(id, parcel, sampler, steering, self.completions_tx.clone())
            }
            Task::Ship {
                slot,
                slot_position,
                drop,
            } => {
                info!(robot = id, slot, "ship task assigned");
                TaskSequence::ship(
                    id,
                    slot,
                    slot_position,
                    drop,
                    sampler,
                    steering,
                    self.completions_tx.clone(),
                )
            }
        };
        self.sequences.insert(id, sequence);

        (AssignOutcome::Assigned, None)
    }

    fn write_telemetry(&mut self, store: &mut dyn WarehouseStore) {
        for (idx, robot) in self.robots.iter().enumerate() {
            let telemetry = RobotTelemetry {
                position: self.estimates[idx],
                battery: robot.battery,
                state: robot.state.as_str(),
            };
            if let Err(e) = store.write_telemetry(robot.id, &telemetry) {
                debug!(robot = robot.id, error = %e, "telemetry write failed");
            }
        }
    }

    fn advance_sequences<P: PathPlanner>(
        &mut self,
        world: &mut dyn FleetWorld,
        store: &mut dyn WarehouseStore,
        paths: &mut PathRequestQueue<P>,
        dt: f32,
    ) {
        for idx in 0..self.robots.len() {
            if !self.robots[idx].state.is_working() {
                continue;
            }
            let id = idx as RobotId;
            let Some(sequence) = self.sequences.get_mut(&id) else {
                continue;
            };

            let mut view = world.view(id);
            let status = sequence.advance(
                &mut self.robots[idx],
                &mut view,
                store,
                paths,
                &mut self.maps,
                dt,
            );
            if status != SeqStatus::InProgress {
                self.sequences.remove(&id);
            }
        }
    }

    // --------------------------------------------------------
    // Helpers
    // --------------------------------------------------------

    fn requeue(&mut self, task: Task) {
        match &task {
            Task::Store { .. } => self.pending_store.push_back(task),
            Task::Ship { .. } => self.pending_ship.push_back(task),
        }
    }

    fn pending_ship_contains(&self, slot: crate::core::SlotId) -> bool {
        self.pending_ship
            .iter()
            .any(|t| matches!(t, Task::Ship { slot: s, .. } if *s == slot))
    }

    fn pending_store_contains(&self, position: Point3) -> bool {
        use crate::core::PosKey;
        let key = PosKey::from(position);
        self.pending_store
            .iter()
            .any(|t| matches!(t, Task::Store { parcel } if PosKey::from(parcel.position) == key))
    }

    /// Next conveyor drop point, round-robin.
    fn take_drop_point(&mut self) -> Option<Point3> {
        if self.conveyor_drops.is_empty() {
            return None;
        }
        let drop = self.conveyor_drops[self.next_drop % self.conveyor_drops.len()];
        self.next_drop += 1;
        Some(drop)
    }

    fn make_sampler(&self) -> ObstacleSampler {
        let s = &self.config.steering;
        ObstacleSampler::new(s.ray_count, s.max_range, s.obstacle_threshold)
    }

    fn make_steering(&self, id: RobotId) -> SteeringEngine {
        let s = &self.config.steering;
        SteeringEngine::new(SteeringEngineConfig {
            clear_angle_deg: s.clear_angle_deg,
            stop_fraction: s.stop_fraction,
            stop_cooldown: Duration::from_secs_f32(s.stop_cooldown_secs),
            side_weight: s.side_weight,
            front_arc_deg: 60.0,
            default_heading_deg: s.default_heading_deg,
            seed: if s.seed == 0 { 0 } else { s.seed + id as u64 },
        })
    }
}

fn localizer_config(config: &FleetConfig, id: RobotId) -> LocalizerConfig {
    let l = &config.localization;
    LocalizerConfig {
        sensor_range: l.sensor_range,
        noise_magnitude: l.noise_magnitude,
        weight_normalizer: l.weight_normalizer,
        min_landmarks: l.min_landmarks,
        process_noise: l.process_noise,
        measurement_noise: l.measurement_noise,
        seed: if l.seed == 0 { 0 } else { l.seed + id as u64 },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::{GridPlanner, NavGrid};
    use crate::world::sim::SimWorld;
    use crate::world::store::MemoryStore;

    fn test_config() -> FleetConfig {
        let mut config = FleetConfig::default();
        config.localization.seed = 42;
        config.steering.seed = 7;
        config
    }

    fn test_paths() -> PathRequestQueue<GridPlanner> {
        let grid = NavGrid::new(48, 48, 0.5, Point3::new(-12.0, 0.0, -12.0));
        PathRequestQueue::new(GridPlanner::new(grid))
    }

    fn tick_n(
        orchestrator: &mut Orchestrator,
        world: &mut SimWorld,
        store: &mut MemoryStore,
        paths: &mut PathRequestQueue<GridPlanner>,
        n: usize,
    ) {
        let dt = 0.05;
        for _ in 0..n {
            orchestrator.tick(world, store, paths, dt);
            paths.drain();
            world.step(dt);
        }
    }

    #[test]
    fn test_assignment_is_idempotent() {
        let mut world = SimWorld::new();
        world.add_robot(Point3::new(0.0, 0.0, 0.0));
        world.add_robot(Point3::new(8.0, 0.0, 8.0));

        let mut store = MemoryStore::new();
        store.add_parcel(10, Point3::new(2.0, 0.2, 2.0), "food", "rice");
        store.add_slot(1, Point3::new(6.0, 1.0, 3.0), "food");

        let mut orchestrator = Orchestrator::new(test_config(), &world, vec![]);
        let mut paths = test_paths();

        // Several poll cycles while the parcel still shows as pending in
        // the store; the claim map must keep it single-assigned.
        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 35);

        let working: Vec<_> = (0..2)
            .filter(|&id| orchestrator.robot(id).state.is_working())
            .collect();
        assert_eq!(working.len(), 1);
        // Robot 0 is closest to the parcel
        assert_eq!(working[0], 0);
        assert_eq!(orchestrator.robot(1).state, RobotState::Idle);
    }

    #[test]
    fn test_recharge_saves_and_resumes_exactly() {
        let mut world = SimWorld::new();
        world.add_robot(Point3::ZERO);
        world.place_robot(0, Point3::new(2.0, 0.0, 0.0));

        let mut store = MemoryStore::new();
        let mut orchestrator = Orchestrator::new(test_config(), &world, vec![]);
        let mut paths = test_paths();

        let destination = Point3::new(5.0, 0.0, 5.0);
        {
            let robot = orchestrator.robot_mut(0);
            robot.state = RobotState::Storing;
            robot.destination = destination;
            robot.battery = 10.0;
        }

        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 1);
        assert_eq!(orchestrator.robot(0).state, RobotState::Recharging);

        // Drive home and charge to full: 90 battery at 100/30 per second
        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 1200);

        let robot = orchestrator.robot(0);
        assert_eq!(robot.state, RobotState::Storing);
        assert_eq!(robot.destination, destination);
        assert_eq!(robot.battery, 100.0);
    }

    #[test]
    fn test_proximity_pauses_higher_id_of_working_pair() {
        let mut world = SimWorld::new();
        world.add_robot(Point3::new(3.0, 0.0, 0.0));
        world.add_robot(Point3::new(3.5, 0.0, 0.0));

        let mut store = MemoryStore::new();
        let mut orchestrator = Orchestrator::new(test_config(), &world, vec![]);
        let mut paths = test_paths();

        orchestrator.robot_mut(0).state = RobotState::Storing;
        orchestrator.robot_mut(1).state = RobotState::Shipping;

        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 1);

        assert_eq!(orchestrator.robot(0).state, RobotState::Storing);
        assert_eq!(orchestrator.robot(1).state, RobotState::Wait);

        // Robot 0 finishes; once the wait runs out the paused robot
        // resumes its saved state since the conflict is gone.
        orchestrator.robot_mut(0).state = RobotState::Idle;
        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 45);
        assert_eq!(orchestrator.robot(1).state, RobotState::Shipping);
    }

    #[test]
    fn test_proximity_ignores_idle_robots() {
        let mut world = SimWorld::new();
        world.add_robot(Point3::new(3.0, 0.0, 0.0));
        world.add_robot(Point3::new(3.5, 0.0, 0.0));

        let mut store = MemoryStore::new();
        let mut orchestrator = Orchestrator::new(test_config(), &world, vec![]);
        let mut paths = test_paths();

        orchestrator.robot_mut(0).state = RobotState::Storing;

        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 1);

        assert_eq!(orchestrator.robot(0).state, RobotState::Storing);
        assert_eq!(orchestrator.robot(1).state, RobotState::Idle);
    }

    #[test]
    fn test_ship_tasks_rotate_drop_points() {
        let mut world = SimWorld::new();
        world.add_robot(Point3::new(-2.0, 0.0, 0.0));
        world.add_robot(Point3::new(0.0, 0.0, 0.0));
        world.add_robot(Point3::new(2.0, 0.0, 0.0));

        let mut store = MemoryStore::new();
        for (slot, parcel, x) in [(1u32, 10u32, 4.0f32), (2, 11, 5.0), (3, 12, 6.0)] {
            store.add_slot(slot, Point3::new(x, 1.0, 4.0), "food");
            store.add_parcel(parcel, Point3::new(x, 1.0, 4.0), "food", "rice");
            store.preload_slot(parcel, slot);
            store.add_order(slot);
        }

        let drops = vec![Point3::new(-6.0, 0.3, -6.0), Point3::new(6.0, 0.3, -6.0)];
        let mut orchestrator = Orchestrator::new(test_config(), &world, drops);
        let mut paths = test_paths();

        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 1);

        // All three orders assigned in one poll, drops handed out
        // round-robin across the two conveyor points.
        for id in 0..3 {
            assert_eq!(orchestrator.robot(id).state, RobotState::Shipping);
        }
        assert_eq!(orchestrator.drop_cursor(), 3);
    }

    #[test]
    fn test_assignment_rolls_back_when_store_write_fails() {
        let mut world = SimWorld::new();
        world.add_robot(Point3::ZERO);

        let mut store = MemoryStore::new();
        store.add_parcel(10, Point3::new(2.0, 0.2, 2.0), "food", "rice");
        store.add_slot(1, Point3::new(6.0, 1.0, 3.0), "food");
        // First write (the assignment telemetry) fails
        store.fail_next(1);

        let mut orchestrator = Orchestrator::new(test_config(), &world, vec![]);
        let mut paths = test_paths();

        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 1);
        assert_eq!(orchestrator.robot(0).state, RobotState::Idle);
        assert_eq!(orchestrator.claim_count(), 0);
        assert_eq!(orchestrator.pending_task_count(), 1);

        // Next poll cycle retries the queued task and succeeds
        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 10);
        assert_eq!(orchestrator.robot(0).state, RobotState::Storing);
        assert_eq!(orchestrator.pending_task_count(), 0);
    }

    #[test]
    fn test_unassignable_task_waits_in_queue() {
        let mut world = SimWorld::new();
        world.add_robot(Point3::ZERO);

        let mut store = MemoryStore::new();
        store.add_parcel(10, Point3::new(2.0, 0.2, 2.0), "food", "rice");
        store.add_parcel(11, Point3::new(-2.0, 0.2, 2.0), "tools", "wrench");
        store.add_slot(1, Point3::new(6.0, 1.0, 3.0), "food");
        store.add_slot(2, Point3::new(-6.0, 1.0, 3.0), "tools");

        let mut orchestrator = Orchestrator::new(test_config(), &world, vec![]);
        let mut paths = test_paths();

        tick_n(&mut orchestrator, &mut world, &mut store, &mut paths, 1);

        // One robot: the first parcel is assigned, the second queues
        assert!(orchestrator.robot(0).state.is_working());
        assert_eq!(orchestrator.pending_task_count(), 1);
    }
}
