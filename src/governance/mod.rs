//! Governance collaborators: role authority, pause gate, and time.
//!
//! The core never decides who is an admin or whether the system is
//! paused; it asks these seams. In-process implementations are provided
//! for the development server and tests.

pub mod clock;
pub mod pause;
pub mod roles;

pub use clock::{Clock, CooldownTracker, ManualClock, RateLimitedAction, SystemClock};
pub use pause::{PauseGate, PauseSwitch};
pub use roles::{Capability, RoleAuthority, StaticRoleAuthority};
