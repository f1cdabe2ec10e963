use alloc::sync::Arc;

use listwindow::ListOptions;

use crate::{RecoveryContext, RecoveryError};

/// Configuration for [`crate::ScrollCoordinator`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinatorOptions {
    pub item_height: f64,
    pub buffer: usize,
    /// Floor for the visible item count derived from the viewport height.
    pub max_visible_items: usize,
    /// Inactivity after which `is_scrolling` flips back to `false`.
    pub scroll_debounce_ms: u64,
    pub load_more_cooldown_ms: u64,
    pub height_stabilization_ms: u64,
    /// Distance from the end of the content at which "load more" should fire.
    pub load_more_threshold: f64,
}

impl CoordinatorOptions {
    pub fn new(item_height: f64) -> Self {
        Self {
            item_height,
            buffer: 5,
            max_visible_items: 20,
            scroll_debounce_ms: 200,
            load_more_cooldown_ms: 500,
            height_stabilization_ms: 300,
            load_more_threshold: 200.0,
        }
    }

    /// Mirrors the geometry fields of a calculator's options.
    pub fn from_list_options(list: &ListOptions) -> Self {
        Self {
            buffer: list.buffer,
            max_visible_items: list.max_visible_items,
            ..Self::new(list.item_height)
        }
    }

    pub fn with_scroll_debounce_ms(mut self, delay_ms: u64) -> Self {
        self.scroll_debounce_ms = delay_ms;
        self
    }

    pub fn with_load_more_cooldown_ms(mut self, duration_ms: u64) -> Self {
        self.load_more_cooldown_ms = duration_ms;
        self
    }

    pub fn with_height_stabilization_ms(mut self, duration_ms: u64) -> Self {
        self.height_stabilization_ms = duration_ms;
        self
    }

    pub fn with_load_more_threshold(mut self, threshold: f64) -> Self {
        self.load_more_threshold = threshold;
        self
    }
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self::new(50.0)
    }
}

pub type RecoveryCallback = Arc<dyn Fn(&RecoveryContext) + Send + Sync>;
pub type RecoveryFailCallback = Arc<dyn Fn(&RecoveryError, &RecoveryContext) + Send + Sync>;

/// Configuration for [`crate::RecoveryScheduler`].
#[derive(Clone)]
pub struct RecoveryOptions {
    pub enabled: bool,
    /// Maximum number of attempts before the scheduler gives up.
    pub recovery_attempts: u32,
    /// Delay between scheduling and running an attempt.
    pub recovery_delay_ms: u64,

    pub on_recovery_start: Option<RecoveryCallback>,
    pub on_recovery_success: Option<RecoveryCallback>,
    /// Fired for every failed attempt with that attempt's error. On the final attempt
    /// `context.exhausted` is set.
    pub on_recovery_fail: Option<RecoveryFailCallback>,
}

impl RecoveryOptions {
    pub fn new() -> Self {
        Self {
            enabled: true,
            recovery_attempts: 3,
            recovery_delay_ms: 1000,
            on_recovery_start: None,
            on_recovery_success: None,
            on_recovery_fail: None,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_recovery_attempts(mut self, attempts: u32) -> Self {
        self.recovery_attempts = attempts;
        self
    }

    pub fn with_recovery_delay_ms(mut self, delay_ms: u64) -> Self {
        self.recovery_delay_ms = delay_ms;
        self
    }

    pub fn with_on_recovery_start(
        mut self,
        f: Option<impl Fn(&RecoveryContext) + Send + Sync + 'static>,
    ) -> Self {
        self.on_recovery_start = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_recovery_success(
        mut self,
        f: Option<impl Fn(&RecoveryContext) + Send + Sync + 'static>,
    ) -> Self {
        self.on_recovery_success = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_recovery_fail(
        mut self,
        f: Option<impl Fn(&RecoveryError, &RecoveryContext) + Send + Sync + 'static>,
    ) -> Self {
        self.on_recovery_fail = f.map(|f| Arc::new(f) as _);
        self
    }
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for RecoveryOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecoveryOptions")
            .field("enabled", &self.enabled)
            .field("recovery_attempts", &self.recovery_attempts)
            .field("recovery_delay_ms", &self.recovery_delay_ms)
            .finish_non_exhaustive()
    }
}
