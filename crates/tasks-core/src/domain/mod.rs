//! Domain model (ids, text, position, state, errors).

pub mod errors;
pub mod ids;
pub mod position;
pub mod state;
pub mod task;

pub use self::errors::{ErrorKind, StoreError};
pub use self::ids::TaskId;
pub use self::position::Position;
pub use self::state::StoreState;
pub use self::task::{Task, TaskEntry, TaskText};
