//! Per-robot lifecycle state.

use crate::core::{Point3, RobotId};

/// Robot lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotState {
    Idle,
    Wait,
    Recharging,
    Storing,
    Shipping,
}

impl RobotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotState::Idle => "idle",
            RobotState::Wait => "wait",
            RobotState::Recharging => "recharging",
            RobotState::Storing => "storing",
            RobotState::Shipping => "shipping",
        }
    }

    /// States that drive a task sequence forward.
    pub fn is_working(&self) -> bool {
        matches!(self, RobotState::Storing | RobotState::Shipping)
    }
}

/// State and destination saved before an interrupt (recharge, wait),
/// restored exactly on resume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumeSnapshot {
    pub state: RobotState,
    pub destination: Point3,
}

/// Orchestrator-owned robot bookkeeping. Physical state lives in the rig.
#[derive(Debug)]
pub struct Robot {
    pub id: RobotId,
    pub state: RobotState,
    /// Battery level, 0 to 100.
    pub battery: f32,
    /// Current navigation destination.
    pub destination: Point3,
    /// Home/charging pose.
    pub home: Point3,
    /// Snapshot to restore after the current interrupt ends.
    pub saved: Option<ResumeSnapshot>,
    /// Seconds left in the Wait state.
    pub wait_remaining: f32,
}

impl Robot {
    pub fn new(id: RobotId, home: Point3) -> Self {
        Self {
            id,
            state: RobotState::Idle,
            battery: 100.0,
            destination: home,
            home,
            saved: None,
            wait_remaining: 0.0,
        }
    }

    /// Save the current state and enter an interrupt state. A nested
    /// interrupt keeps the original snapshot so resume lands on real work.
    pub fn interrupt(&mut self, into: RobotState) {
        if self.saved.is_none() {
            self.saved = Some(ResumeSnapshot {
                state: self.state,
                destination: self.destination,
            });
        }
        self.state = into;
    }

    /// Restore the saved state and destination, if any.
    pub fn resume(&mut self) {
        if let Some(snapshot) = self.saved.take() {
            self.state = snapshot.state;
            self.destination = snapshot.destination;
        } else {
            self.state = RobotState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_and_resume_restores_exactly() {
        let mut robot = Robot::new(0, Point3::ZERO);
        robot.state = RobotState::Storing;
        robot.destination = Point3::new(4.0, 0.0, 2.0);

        robot.interrupt(RobotState::Recharging);
        assert_eq!(robot.state, RobotState::Recharging);

        robot.resume();
        assert_eq!(robot.state, RobotState::Storing);
        assert_eq!(robot.destination, Point3::new(4.0, 0.0, 2.0));
        assert!(robot.saved.is_none());
    }

    #[test]
    fn test_nested_interrupt_keeps_first_snapshot() {
        let mut robot = Robot::new(0, Point3::ZERO);
        robot.state = RobotState::Shipping;
        robot.destination = Point3::new(1.0, 0.0, 1.0);

        robot.interrupt(RobotState::Wait);
        robot.interrupt(RobotState::Recharging);
        robot.resume();

        assert_eq!(robot.state, RobotState::Shipping);
        assert_eq!(robot.destination, Point3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_resume_without_snapshot_goes_idle() {
        let mut robot = Robot::new(0, Point3::ZERO);
        robot.state = RobotState::Wait;
        robot.resume();
        assert_eq!(robot.state, RobotState::Idle);
    }
}
