pub mod delivery;
pub mod queue;
pub mod rate_limit;
pub mod scheduler;
pub mod worker;

pub use delivery::DeliveryExecutor;
pub use queue::{InMemoryReminderQueue, RedisReminderQueue, ReminderQueue};
pub use rate_limit::RateLimiter;
pub use scheduler::ReminderScheduler;
pub use worker::ReminderWorkerService;
