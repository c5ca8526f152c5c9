//! Session scheduler
//!
//! ```text
//! Idle ──authenticate──► Authenticating ──ok──► Polling ◄──┐
//!                             │                    │        │ tick (refresh
//!                           error                 stop      │ token if due)
//!                             ▼                    ▼        │
//!                        Idle + error           Stopped ────┘ (next authenticate)
//! ```
//!
//! Every `authenticate` starts a new generation; results of older
//! generations (in-flight logins or polls) are discarded when they arrive.

mod manager;
mod poll;
mod state;

pub use manager::MyStarSession;
