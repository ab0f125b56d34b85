use crate::physics::BodyId;
use glam::Vec3;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DiceEvent {
    BodySpawned { body: BodyId, name: String },
    Rolled { body: BodyId, outcome: u32, impulse: Vec3 },
    CollisionStarted { a: BodyId, b: BodyId },
    CollisionEnded { a: BodyId, b: BodyId },
    /// `face` is the 1-based material slot facing up, when one could be determined.
    Settled { body: BodyId, face: Option<u32> },
}

impl DiceEvent {
    fn ordered_pair(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn collision_started(a: BodyId, b: BodyId) -> Self {
        let (a, b) = Self::ordered_pair(a, b);
        DiceEvent::CollisionStarted { a, b }
    }

    pub fn collision_ended(a: BodyId, b: BodyId) -> Self {
        let (a, b) = Self::ordered_pair(a, b);
        DiceEvent::CollisionEnded { a, b }
    }
}

impl fmt::Display for DiceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceEvent::BodySpawned { body, name } => write!(f, "BodySpawned body={} name={}", body.index(), name),
            DiceEvent::Rolled { body, outcome, impulse } => write!(
                f,
                "Rolled body={} outcome={} impulse=({:.1}, {:.1}, {:.1})",
                body.index(),
                outcome,
                impulse.x,
                impulse.y,
                impulse.z
            ),
            DiceEvent::CollisionStarted { a, b } => {
                write!(f, "CollisionStarted a={} b={}", a.index(), b.index())
            }
            DiceEvent::CollisionEnded { a, b } => {
                write!(f, "CollisionEnded a={} b={}", a.index(), b.index())
            }
            DiceEvent::Settled { body, face: Some(face) } => {
                write!(f, "Settled body={} face={}", body.index(), face)
            }
            DiceEvent::Settled { body, face: None } => write!(f, "Settled body={} face=?", body.index()),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    events: Vec<DiceEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: DiceEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<DiceEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_pairs_are_ordered() {
        let event = DiceEvent::collision_started(BodyId::new(5), BodyId::new(2));
        assert_eq!(event, DiceEvent::CollisionStarted { a: BodyId::new(2), b: BodyId::new(5) });
        assert_eq!(event.to_string(), "CollisionStarted a=2 b=5");
    }

    #[test]
    fn drain_empties_the_bus() {
        let mut bus = EventBus::default();
        bus.push(DiceEvent::Settled { body: BodyId::new(0), face: Some(3) });
        bus.push(DiceEvent::Settled { body: BodyId::new(1), face: None });
        assert_eq!(bus.len(), 2);
        let drained = bus.drain();
        assert!(bus.is_empty());
        assert_eq!(drained[0].to_string(), "Settled body=0 face=3");
        assert_eq!(drained[1].to_string(), "Settled body=1 face=?");
    }
}
