//! The bounded-queue, keyed-mutex, retrying dispatcher (`spec.md` §4.3).

mod config;
mod dispatcher;
mod keyed_mutex;
mod retry;

pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, EnqueueError};
pub use keyed_mutex::KeyedMutexTable;
pub use retry::backoff_delay;
