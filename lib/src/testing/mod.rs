//! In-kernel test harness.
//!
//! Host-runnable logic is covered by ordinary `#[cfg(test)]` modules; the
//! harness here exists for the parts that only behave on hardware (loaded
//! tables, live dispatch). Suites are defined with `define_test_suite!`
//! and run from the boot path when the `builtin-tests` feature is on.

mod harness;
pub mod suite_masks;

pub use harness::{
    TestRunSummary, TestSuiteDesc, TestSuiteResult, measure_elapsed_ms, timestamp,
};
pub use suite_masks::*;

/// Result of a single test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestResult {
    /// Test passed successfully
    Pass,
    /// Test failed (assertion or explicit failure)
    Fail,
    /// Test was skipped (e.g., prerequisite missing)
    Skipped,
}

impl TestResult {
    /// Returns true if the test passed.
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass | Self::Skipped)
    }
}

/// Return a passing test result.
#[macro_export]
macro_rules! pass {
    () => {
        $crate::testing::TestResult::Pass
    };
}

/// Return a failing test result with optional message.
#[macro_export]
macro_rules! fail {
    () => {
        $crate::testing::TestResult::Fail
    };
    ($msg:expr) => {{
        $crate::klog_info!("TEST FAIL: {}", $msg);
        $crate::testing::TestResult::Fail
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::klog_info!(concat!("TEST FAIL: ", $fmt), $($arg)*);
        $crate::testing::TestResult::Fail
    }};
}

/// Run one test function and fold the outcome into (passed, total).
#[macro_export]
macro_rules! run_test {
    ($passed:expr, $total:expr, $test_fn:expr) => {{
        $total += 1;
        let result: $crate::testing::TestResult = $test_fn();
        if result.is_pass() {
            $passed += 1;
        } else {
            $crate::klog_info!("TEST FAIL: {}", stringify!($test_fn));
        }
        result
    }};
}

/// Define a test suite for the kernel test harness.
///
/// Generates a runner function plus a static `TestSuiteDesc`:
///
/// ```ignore
/// define_test_suite!(trap_dispatch, SUITE_TRAPS, [
///     test_register_then_dispatch,
///     test_unregistered_vector_reports,
/// ]);
/// ```
#[macro_export]
macro_rules! define_test_suite {
    ($suite_name:ident, $mask:expr, [$($test_fn:path),* $(,)?]) => {
        $crate::paste::paste! {
            fn [<run_ $suite_name _suite>](out: &mut $crate::testing::TestSuiteResult) -> i32 {
                let start = $crate::testing::timestamp();
                let mut passed = 0u32;
                let mut total = 0u32;

                $(
                    $crate::run_test!(passed, total, $test_fn);
                )*

                out.name = stringify!($suite_name);
                out.total = total;
                out.passed = passed;
                out.failed = total.saturating_sub(passed);
                out.elapsed_ms = $crate::testing::measure_elapsed_ms(start, $crate::testing::timestamp());

                if passed == total { 0 } else { -1 }
            }

            pub static [<$suite_name:upper _SUITE_DESC>]: $crate::testing::TestSuiteDesc =
                $crate::testing::TestSuiteDesc {
                    name: stringify!($suite_name),
                    mask_bit: $mask,
                    run: [<run_ $suite_name _suite>],
                };
        }
    };
}
