pub mod fake_rcon;
pub mod sources;

pub use fake_rcon::{FakeRconOptions, FakeRconServer};
pub use sources::{snapshot_with, ScriptedSource, SlowSource, Step, StubSource};
pub use subscribers::{FailingSubscriber, PanickingSubscriber, RecordingSubscriber};
