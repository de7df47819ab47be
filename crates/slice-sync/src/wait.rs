//! Dependency wait primitives
//!
//! Dependencies are satisfied by observation: a waiter polls the shared
//! status table until the target package (or every package of a target
//! group) is synced, or the caller-supplied timeout elapses. Every poll
//! tick is an await point, so dropping the future (ambient cancellation)
//! takes effect at the next tick.

use std::time::Duration;

use crate::status::StatusTable;
use crate::{Error, Result};

/// Default polling interval for dependency waits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Block until `package` is fully synced or `timeout` elapses.
///
/// # Errors
///
/// [`Error::DependencyTimeout`] naming the package when the timeout
/// elapses first.
pub async fn wait_for_package(
    table: &StatusTable,
    package: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    let waited = tokio::time::timeout(timeout, async {
        let mut ticker = tokio::time::interval(poll);
        loop {
            ticker.tick().await;
            if table.package_synced(package) {
                return;
            }
            tracing::debug!(package = %package, "dependency not yet synced, polling");
        }
    })
    .await;

    waited.map_err(|_| Error::DependencyTimeout {
        dependency: package.to_string(),
        waited: timeout,
    })
}

/// Block until every package of a group is fully synced or `timeout`
/// elapses. The timeout applies per member package.
///
/// # Errors
///
/// [`Error::DependencyTimeout`] naming the group and the first unmet
/// package.
pub async fn wait_for_group(
    table: &StatusTable,
    group: &str,
    packages: &[String],
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    for package in packages {
        wait_for_package(table, package, timeout, poll)
            .await
            .map_err(|_| Error::DependencyTimeout {
                dependency: format!("group {} (package {})", group, package),
                waited: timeout,
            })?;
    }
    Ok(())
}
