//! Profiling utilities for extraction stages
//!
//! This module provides integration with the puffin profiler to track
//! planning, querying and stitching when the "profiling" feature is enabled.

/// Re-export puffin macros for convenience
#[cfg(feature = "profiling")]
pub use puffin::{profile_function, profile_scope};

/// Generic profiling scope macro for high-level operation instrumentation.
#[macro_export]
macro_rules! plucker_profile_scope {
    ($category:literal, $operation:expr) => {
        #[cfg(feature = "profiling")]
        puffin::profile_scope!($category, $operation);
    };
}

/// Generic profiling function marker.
#[macro_export]
macro_rules! plucker_profile_function {
    () => {
        #[cfg(feature = "profiling")]
        puffin::profile_function!();
    };
}

#[cfg(test)]
mod tests {
    fn instrumented() -> usize {
        crate::plucker_profile_function!();
        crate::plucker_profile_scope!("extract", "stage");
        1
    }

    #[test]
    fn macros_expand_with_or_without_the_feature() {
        assert_eq!(instrumented(), 1);
    }
}
