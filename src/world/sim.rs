//! Kinematic simulation backing for the boundary traits.
//!
//! Robots are points with a yaw and a mast carriage; obstacles and
//! landmarks are circles on the floor plane. No physics beyond constant
//! speed motion toward targets.

use crate::core::{LandmarkId, ParcelId, Point3, RobotId};
use crate::world::sensors::{ray_circle_distance, EntityHandle, SensorSuite};
use crate::world::{FleetWorld, RobotRig, WorldView};

/// Mast travel bounds (meters).
const MAST_MIN: f32 = 0.0;
const MAST_MAX: f32 = 3.0;

/// A simulated robot body.
#[derive(Debug)]
pub struct SimBody {
    position: Point3,
    yaw: f32,
    mast: f32,
    move_target: Option<Point3>,
    yaw_target: Option<f32>,
    mast_target: f32,
    carrying: Option<ParcelId>,
    linear_speed: f32,
    angular_speed: f32,
    mast_speed: f32,
}

impl SimBody {
    fn new(position: Point3) -> Self {
        Self {
            position,
            yaw: 0.0,
            mast: 0.0,
            move_target: None,
            yaw_target: None,
            mast_target: 0.0,
            carrying: None,
            linear_speed: 1.5,
            angular_speed: 3.0,
            mast_speed: 0.6,
        }
    }

    fn step(&mut self, dt: f32) {
        // Drive toward the move target on the floor plane
        if let Some(target) = self.move_target {
            let dx = target.x - self.position.x;
            let dz = target.z - self.position.z;
            let dist = (dx * dx + dz * dz).sqrt();
            let step = self.linear_speed * dt;

            if dist > 1e-4 {
                // Yaw tracks the motion direction while driving
                self.yaw_target = Some(dz.atan2(dx));
            }

            if dist <= step {
                self.position.x = target.x;
                self.position.z = target.z;
            } else if dist > 0.0 {
                self.position.x += dx / dist * step;
                self.position.z += dz / dist * step;
            }
        }

        // Rotate toward the yaw target
        if let Some(target) = self.yaw_target {
            let diff = crate::core::types::normalize_rad(target - self.yaw);
            let step = self.angular_speed * dt;
            if diff.abs() <= step {
                self.yaw = target;
            } else {
                self.yaw += step * diff.signum();
            }
        }

        // Mast carriage
        let diff = self.mast_target - self.mast;
        let step = self.mast_speed * dt;
        if diff.abs() <= step {
            self.mast = self.mast_target;
        } else {
            self.mast += step * diff.signum();
        }
    }
}

impl RobotRig for SimBody {
    fn position(&self) -> Point3 {
        self.position
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn odometry(&self) -> Point3 {
        // The simulated encoder stack reports the true pose; localization
        // adds its own prediction noise on top.
        self.position
    }

    fn mast_height(&self) -> f32 {
        self.mast
    }

    fn command_move(&mut self, target: Point3) {
        self.move_target = Some(target);
    }

    fn command_orient(&mut self, yaw: f32) {
        self.move_target = None;
        self.yaw_target = Some(yaw);
    }

    fn command_mast(&mut self, height: f32) {
        self.mast_target = height.clamp(MAST_MIN, MAST_MAX);
    }

    fn halt(&mut self) {
        self.move_target = None;
    }

    fn arrived(&self, tolerance: f32) -> bool {
        match self.move_target {
            Some(target) => self.position.distance_xz(&target) <= tolerance,
            None => true,
        }
    }

    fn oriented(&self, tolerance_rad: f32) -> bool {
        match self.yaw_target {
            Some(target) => {
                crate::core::types::normalize_rad(target - self.yaw).abs() <= tolerance_rad
            }
            None => true,
        }
    }

    fn mast_settled(&self, tolerance: f32) -> bool {
        (self.mast - self.mast_target).abs() <= tolerance
    }

    fn attach_payload(&mut self, parcel: ParcelId) {
        self.carrying = Some(parcel);
    }

    fn detach_payload(&mut self, _release_offset: Point3) -> Option<ParcelId> {
        self.carrying.take()
    }

    fn carrying(&self) -> Option<ParcelId> {
        self.carrying
    }
}

/// Static world geometry: obstacle and landmark circles.
#[derive(Debug, Default)]
pub struct Arena {
    entities: Vec<(EntityHandle, Point3, f32)>,
}

impl Arena {
    pub fn add_obstacle(&mut self, id: u32, center: Point3, radius: f32) {
        self.entities
            .push((EntityHandle::Obstacle(id), center, radius));
    }

    pub fn add_landmark(&mut self, id: LandmarkId, center: Point3) {
        // Landmarks are thin posts
        self.entities
            .push((EntityHandle::Landmark(id), center, 0.1));
    }
}

impl SensorSuite for Arena {
    fn range_scan(&self, origin: Point3, directions_rad: &[f32], max_range: f32) -> Vec<f32> {
        directions_rad
            .iter()
            .map(|dir| {
                let dx = dir.cos();
                let dz = dir.sin();
                let mut nearest = max_range;
                for (_, center, radius) in &self.entities {
                    if let Some(d) = ray_circle_distance(origin, dx, dz, *center, *radius) {
                        if d < nearest {
                            nearest = d;
                        }
                    }
                }
                nearest
            })
            .collect()
    }

    fn proximity(&self, origin: Point3, radius: f32) -> Vec<(EntityHandle, Point3)> {
        self.entities
            .iter()
            .filter(|(_, center, r)| origin.distance_xz(center) <= radius + r)
            .map(|(handle, center, _)| (*handle, *center))
            .collect()
    }

    fn line_of_sight(&self, origin: Point3, target: Point3) -> Option<EntityHandle> {
        let dist = origin.distance_xz(&target);
        if dist <= f32::EPSILON {
            return None;
        }
        let dx = (target.x - origin.x) / dist;
        let dz = (target.z - origin.z) / dist;

        let mut nearest: Option<(f32, EntityHandle)> = None;
        for (handle, center, radius) in &self.entities {
            if let Some(d) = ray_circle_distance(origin, dx, dz, *center, *radius) {
                if d <= dist && nearest.map_or(true, |(best, _)| d < best) {
                    nearest = Some((d, *handle));
                }
            }
        }
        nearest.map(|(_, handle)| handle)
    }
}

/// The simulated warehouse floor: robot bodies plus static geometry.
#[derive(Debug, Default)]
pub struct SimWorld {
    bodies: Vec<SimBody>,
    homes: Vec<Point3>,
    pub arena: Arena,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a robot at its home pose; returns its id.
    pub fn add_robot(&mut self, home: Point3) -> RobotId {
        let id = self.bodies.len() as RobotId;
        self.bodies.push(SimBody::new(home));
        self.homes.push(home);
        id
    }

    /// Teleport a robot (test/scenario setup only).
    pub fn place_robot(&mut self, robot: RobotId, position: Point3) {
        if let Some(body) = self.bodies.get_mut(robot as usize) {
            body.position = position;
        }
    }
}

impl FleetWorld for SimWorld {
    fn robot_count(&self) -> usize {
        self.bodies.len()
    }

    fn view(&mut self, robot: RobotId) -> WorldView<'_> {
        let body = &mut self.bodies[robot as usize];
        WorldView {
            rig: body,
            sensors: &self.arena,
        }
    }

    fn rig(&self, robot: RobotId) -> &dyn RobotRig {
        &self.bodies[robot as usize]
    }

    fn home_pose(&self, robot: RobotId) -> Point3 {
        self.homes[robot as usize]
    }

    fn step(&mut self, dt: f32) {
        for body in &mut self.bodies {
            body.step(dt);
        }
    }
}
