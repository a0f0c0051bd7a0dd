use crate::entity::EntityState;
use crate::error::ComponentError;
use std::str::FromStr;

/// The four cardinal moving directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Code 0.
    Up = 0,
    /// Code 1.
    Left = 1,
    /// Code 2.
    Down = 2,
    /// Code 3.
    Right = 3,
}

impl Direction {
    /// Every direction, in code order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];
}

impl TryFrom<i32> for Direction {
    type Error = ComponentError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Left),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Right),
            other => Err(ComponentError::InvalidDirection(other)),
        }
    }
}

impl FromStr for Direction {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "left" => Ok(Direction::Left),
            "down" => Ok(Direction::Down),
            "right" => Ok(Direction::Right),
            _ => Err(ComponentError::InvalidDirection(-1)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DirectionState {
    active: bool,
    looping: bool,
}

/// Four-way movement driven by press/release style calls.
///
/// A direction moved with `looping = false` is a one-shot impulse: it is
/// stopped automatically after the next [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct MovementComponent {
    /// Pixels per tick.
    pub speed: i32,
    /// Added to `speed` on every tick.
    pub acceleration: i32,
    facing: Direction,
    moving: bool,
    delta_speed: f32,
    state: [DirectionState; 4],
}

impl Default for MovementComponent {
    fn default() -> Self {
        MovementComponent::new(1, 0)
    }
}

impl MovementComponent {
    /// An idle component facing down.
    pub fn new(speed: i32, acceleration: i32) -> Self {
        MovementComponent {
            speed,
            acceleration,
            facing: Direction::Down,
            moving: false,
            delta_speed: speed as f32,
            state: [DirectionState::default(); 4],
        }
    }

    /// True while any direction is active.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Last direction that started moving.
    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// `speed * dt` as of the last `move_toward`.
    pub fn delta_speed(&self) -> f32 {
        self.delta_speed
    }

    /// Currently active directions, in up/left/down/right order.
    pub fn movements(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.state[*d as usize].active)
            .collect()
    }

    /// Whether `direction` is currently pressed.
    pub fn is_active(&self, direction: Direction) -> bool {
        self.state[direction as usize].active
    }

    /// Activates `direction`. With `looping = false` it is released after the next update.
    pub fn move_toward(&mut self, direction: Direction, looping: bool, dt: f32) {
        let slot = &mut self.state[direction as usize];
        if !slot.active {
            self.facing = direction;
        }
        *slot = DirectionState {
            active: true,
            looping,
        };
        self.moving = true;
        self.delta_speed = self.speed as f32 * dt;
    }

    /// Like [`move_toward`](Self::move_toward) for a raw direction code.
    pub fn move_code(&mut self, code: i32, looping: bool, dt: f32) -> Result<(), ComponentError> {
        self.move_toward(Direction::try_from(code)?, looping, dt);
        Ok(())
    }

    /// Releases `direction`. Does nothing while idle.
    pub fn stop(&mut self, direction: Direction) {
        if !self.moving {
            return;
        }
        self.state[direction as usize] = DirectionState::default();
        if self.state.iter().all(|s| !s.active) {
            self.moving = false;
        }
    }

    /// Like [`stop`](Self::stop) for a raw direction code.
    pub fn stop_code(&mut self, code: i32) -> Result<(), ComponentError> {
        self.stop(Direction::try_from(code)?);
        Ok(())
    }

    pub(crate) fn update(&mut self, owner: &mut EntityState) {
        if !self.moving {
            return;
        }

        let on = |d: Direction| self.state[d as usize].active as i32;
        let step = self.speed + self.acceleration;
        let dx = (on(Direction::Left) - on(Direction::Right)) * step;
        let dy = (on(Direction::Up) - on(Direction::Down)) * step;
        owner.position.x -= dx;
        owner.position.y -= dy;

        for direction in self.movements() {
            if !self.state[direction as usize].looping {
                self.stop(direction);
            }
        }
    }
}
