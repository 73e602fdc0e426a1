// a2a-runtime - the Task Manager (dispatcher), worker pools, rate limiter,
// scoped resource pool, and Progress Stream Hub that drive tasks across
// their agent pipeline. Depends only on the store traits from `a2a-store`,
// never on a concrete backend; the concrete agents live in `a2a-agents`.

pub mod dispatcher;
pub mod pool;
pub mod progress;
pub mod rate_limit;
pub mod resource;

pub use dispatcher::{DispatchEvent, TaskManager};
pub use pool::StagePool;
pub use progress::ProgressHub;
pub use rate_limit::RateLimiter;
pub use resource::{ResourcePool, ResourcePoolError};
