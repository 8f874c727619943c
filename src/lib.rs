//! Turns a named media task plus an input file into ffmpeg invocations inside
//! a single output workspace.

pub mod archive;
pub mod bounce;
pub mod codecs;
pub mod config;
pub mod containers;
pub mod dispatcher;
pub mod error;
pub mod ffmpeg;
pub mod frame_rate;
pub mod fstools;
pub mod task;
pub mod validate;
pub mod workspace;

pub use config::Settings;
pub use containers::Container;
pub use dispatcher::{DispatchState, Dispatcher};
pub use error::DispatchError;
pub use frame_rate::FrameRate;
pub use task::Task;
pub use workspace::Workspace;
