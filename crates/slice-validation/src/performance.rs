//! Performance threshold comparison
//!
//! Deployment time and CPU/memory utilization are strict ceilings. The
//! throughput and RTT series carry a 10% tolerance band: measured
//! throughput may undershoot its target by up to 10%, measured RTT may
//! overshoot by up to 10%. Series are compared positionally up to the
//! shorter length; extra measured elements are ignored.

use slice_core::{PerformanceSample, PerformanceThresholds};

use crate::result::PerformanceResult;

/// Compare a sample against thresholds, returning one description per
/// breach. Ceilings and targets of zero are treated as unconfigured.
///
/// Band comparisons are done as `measured * 10` vs `target * 9` (resp.
/// `* 11`) so that the exact-90% and exact-110% boundary cases are not
/// lost to the inexact binary representation of 0.9 and 1.1.
pub fn check_thresholds(
    sample: &PerformanceSample,
    thresholds: &PerformanceThresholds,
) -> Vec<String> {
    let mut breaches = Vec::new();

    if thresholds.deployment_time_secs > 0.0
        && sample.deployment_time_secs > thresholds.deployment_time_secs
    {
        breaches.push(format!(
            "deployment time {:.1}s exceeds maximum {:.1}s",
            sample.deployment_time_secs, thresholds.deployment_time_secs
        ));
    }

    if thresholds.cpu_utilization > 0.0 && sample.cpu_utilization > thresholds.cpu_utilization {
        breaches.push(format!(
            "CPU utilization {:.1}% exceeds maximum {:.1}%",
            sample.cpu_utilization, thresholds.cpu_utilization
        ));
    }

    if thresholds.memory_utilization > 0.0
        && sample.memory_utilization > thresholds.memory_utilization
    {
        breaches.push(format!(
            "memory utilization {:.1}% exceeds maximum {:.1}%",
            sample.memory_utilization, thresholds.memory_utilization
        ));
    }

    for (i, (measured, target)) in sample
        .throughput_mbps
        .iter()
        .zip(&thresholds.throughput_mbps)
        .enumerate()
    {
        if *target > 0.0 && measured * 10.0 < target * 9.0 {
            breaches.push(format!(
                "throughput[{}] {:.1} Mbps below 90% of target {:.1} Mbps",
                i, measured, target
            ));
        }
    }

    for (i, (measured, target)) in sample
        .ping_rtt_ms
        .iter()
        .zip(&thresholds.ping_rtt_ms)
        .enumerate()
    {
        if *target > 0.0 && measured * 10.0 > target * 11.0 {
            breaches.push(format!(
                "rtt[{}] {:.1} ms above 110% of target {:.1} ms",
                i, measured, target
            ));
        }
    }

    breaches
}

/// Build the comparison result for a sample.
pub fn compare(sample: PerformanceSample, thresholds: PerformanceThresholds) -> PerformanceResult {
    let within = check_thresholds(&sample, &thresholds).is_empty();
    PerformanceResult {
        measured: sample,
        thresholds,
        within_thresholds: within,
    }
}
