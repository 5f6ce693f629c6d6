//! ProjectBoard Core Library
//!
//! Platform-agnostic whiteboard engine for project boards: the drawing
//! surface, its undo history, object factories, keyboard routing and
//! persistence against a backend data service.

pub mod camera;
pub mod config;
pub mod factory;
pub mod history;
pub mod keymap;
pub mod persistence;
pub mod session;
pub mod shapes;
pub mod storage;
pub mod surface;
pub mod tools;
pub mod widget;

pub use camera::Camera;
pub use config::{ConfigError, SessionConfig};
pub use factory::ShapeKind;
pub use history::{DEFAULT_HISTORY_CAPACITY, History, Snapshot};
pub use keymap::{Command, KeyEvent, Modifiers, Shortcut, ShortcutRegistry};
pub use persistence::{
    LoadOutcome, SaveOutcome, SyncError, WhiteboardRecord, WhiteboardRepository,
};
pub use session::{KeyOutcome, WhiteboardSession};
pub use storage::{Backend, BackendError, MemoryBackend};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileBackend;
pub use surface::{Surface, SurfaceState};
pub use tools::{CreateAction, Tool, ToolMode};
pub use widget::{WidgetManager, WidgetState};
