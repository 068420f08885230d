pub mod countdown;
pub mod engine;
pub mod notification_dedup;
pub mod notifications;
pub mod poll_cycle;
pub mod projection;

pub use countdown::{CountdownScheduler, CountdownUpdate, TerminalBehavior};
pub use notification_dedup::NotificationDedup;
pub use poll_cycle::PollCycle;
