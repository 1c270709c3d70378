/*!
 * Monitoring
 * Lifecycle notifications, kernel counters, and structured tracing
 */

mod events;
mod notifier;
mod stats;
mod tracer;

pub use events::LifecycleEvent;
pub use notifier::{LifecycleNotifier, NotifierStats};
pub use stats::{AtomicKernelStats, KernelStats};
pub use tracer::{init_tracing, TickSpan};
