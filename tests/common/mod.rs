#![allow(dead_code)]

pub use dagrun_test_utils::builders;
pub use dagrun_test_utils::fake_executor;
pub use dagrun_test_utils::{init_tracing, with_timeout};

use std::time::Duration;

use dagrun::engine::SchedulerOptions;

/// Scheduler options with a short poll interval so tests stay fast.
pub fn fast_options() -> SchedulerOptions {
    SchedulerOptions {
        poll_interval: Duration::from_millis(10),
        ..SchedulerOptions::default()
    }
}
