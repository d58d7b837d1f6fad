//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the h5select crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # Index Array Configuration Options
///
/// ## Require Increasing Indices
/// > default: [`true`]
///
/// If enabled, integer index arrays in a fancy selection must be strictly increasing.
/// Storage engines transfer point lists in storage order, so unsorted or repeated coordinates would be silently reordered.
///
/// ## Index Array Limit
/// > default: `0`
///
/// The maximum number of array-valued components (integer arrays or boolean masks) permitted in one index tuple.
/// The limit is disabled if set to zero.
#[derive(Debug)]
pub struct Config {
    require_increasing_indices: bool,
    index_array_limit: usize,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            require_increasing_indices: true,
            index_array_limit: 0,
        }
    }
}

impl Config {
    /// Get the [require increasing indices](#require-increasing-indices) configuration.
    #[must_use]
    pub fn require_increasing_indices(&self) -> bool {
        self.require_increasing_indices
    }

    /// Set the [require increasing indices](#require-increasing-indices) configuration.
    pub fn set_require_increasing_indices(&mut self, require_increasing_indices: bool) {
        self.require_increasing_indices = require_increasing_indices;
    }

    /// Get the [index array limit](#index-array-limit) configuration.
    #[must_use]
    pub fn index_array_limit(&self) -> usize {
        self.index_array_limit
    }

    /// Set the [index array limit](#index-array-limit) configuration.
    pub fn set_index_array_limit(&mut self, index_array_limit: usize) {
        self.index_array_limit = index_array_limit;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global h5select configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global h5select configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
