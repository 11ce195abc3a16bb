use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Default deadline for response waits.
    pub navigation: Duration,
    /// Default deadline for load-only waits.
    pub page_load: Duration,
    /// Minimum spacing between reload attempts.
    pub reload_tick: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            navigation: Duration::from_millis(30000),
            page_load: Duration::from_millis(30000),
            reload_tick: Duration::from_millis(1000),
        }
    }
}

impl WaitConfig {
    pub fn with_navigation(mut self, ms: u64) -> Self {
        self.navigation = Duration::from_millis(ms);
        self
    }

    pub fn with_page_load(mut self, ms: u64) -> Self {
        self.page_load = Duration::from_millis(ms);
        self
    }

    pub fn fast() -> Self {
        Self {
            navigation: Duration::from_millis(10000),
            page_load: Duration::from_millis(10000),
            reload_tick: Duration::from_millis(500),
        }
    }

    pub fn patient() -> Self {
        Self {
            navigation: Duration::from_millis(60000),
            page_load: Duration::from_millis(60000),
            reload_tick: Duration::from_millis(2000),
        }
    }
}
