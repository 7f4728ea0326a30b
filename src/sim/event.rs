/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound; the
/// simulation never calls into either.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    LeverToggled { id: String, active: bool },
    DoorOpened { id: String },
    DoorClosed { id: String },
    PlatePressed { id: String },
    PlateReleased { id: String },
    CrystalCollected { index: usize, total: u32 },
    BoxIgnited { index: usize, x: f32, y: f32 },
    BoxBurnedOut { x: f32, y: f32 },
    ControlEntered { mover: usize },
    ControlExited { mover: usize },
    MoverActivated { mover: usize },
    MoverParked { mover: usize },
    PlatformRotated { platform: usize },
    PlatformRestored { platform: usize },
    PlatformVanished { platform: usize },
    PlatformReappeared { platform: usize },
    RunWon { score: u32, time_left: f32 },
    RunLost { reason: String },
}
