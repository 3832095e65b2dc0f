//! Health-check primitives for the `SYSTEM` agent (§4.1 "SYSTEM agent"):
//! process presence, port reachability, disk space, and memory headroom.
//! Follows the doctor-check aggregation style used for CLI readiness
//! reports elsewhere in this workspace, generalized into a reusable check
//! library.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use sysinfo::{DiskExt, System, SystemExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCheckResult {
    pub key: String,
    pub status: CheckStatus,
    pub code: String,
    pub detail: Option<String>,
}

impl SystemCheckResult {
    fn pass(key: &str, code: &str, detail: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            status: CheckStatus::Pass,
            code: code.to_string(),
            detail,
        }
    }

    fn fail(key: &str, code: &str, detail: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            status: CheckStatus::Fail,
            code: code.to_string(),
            detail,
        }
    }
}

/// Checks whether any running process has `name_substring` in its name,
/// case-insensitively. `expect_running` flips pass/fail semantics so the
/// same check expresses "must be up" and "must have exited".
pub fn check_process(name_substring: &str, expect_running: bool) -> SystemCheckResult {
    let mut system = System::new();
    system.refresh_processes();

    let needle = name_substring.to_ascii_lowercase();
    let matched = system
        .processes()
        .values()
        .find(|process| process.name().to_ascii_lowercase().contains(&needle));

    match (matched, expect_running) {
        (Some(process), true) => SystemCheckResult::pass(
            "check_process",
            "running",
            Some(format!("pid {} matched '{}'", process.pid(), name_substring)),
        ),
        (None, false) => SystemCheckResult::pass(
            "check_process",
            "not_running",
            Some(format!("no process matching '{name_substring}'")),
        ),
        (Some(process), false) => SystemCheckResult::fail(
            "check_process",
            "unexpectedly_running",
            Some(format!("pid {} matched '{}'", process.pid(), name_substring)),
        ),
        (None, true) => SystemCheckResult::fail(
            "check_process",
            "not_found",
            Some(format!("no process matching '{name_substring}'")),
        ),
    }
}

/// Probes TCP reachability of `host:port` with a connect timeout.
/// `expect_open` flips pass/fail so the same check expresses "must be
/// listening" and "must be closed".
pub fn check_port(host: &str, port: u16, timeout_ms: u64, expect_open: bool) -> SystemCheckResult {
    let address = match format!("{host}:{port}").to_socket_addrs() {
        Ok(mut addresses) => addresses.next(),
        Err(error) => {
            return SystemCheckResult::fail(
                "check_port",
                "unresolvable_address",
                Some(error.to_string()),
            )
        }
    };
    let Some(address): Option<SocketAddr> = address else {
        return SystemCheckResult::fail(
            "check_port",
            "unresolvable_address",
            Some(format!("{host}:{port} resolved to no addresses")),
        );
    };

    let reachable = TcpStream::connect_timeout(&address, Duration::from_millis(timeout_ms)).is_ok();
    match (reachable, expect_open) {
        (true, true) => {
            SystemCheckResult::pass("check_port", "open", Some(format!("{host}:{port} accepted a connection")))
        }
        (false, false) => {
            SystemCheckResult::pass("check_port", "closed", Some(format!("{host}:{port} refused a connection")))
        }
        (true, false) => {
            SystemCheckResult::fail("check_port", "unexpectedly_open", Some(format!("{host}:{port} accepted a connection")))
        }
        (false, true) => {
            SystemCheckResult::fail("check_port", "unreachable", Some(format!("{host}:{port} refused a connection")))
        }
    }
}

/// Checks that the filesystem holding `path` has at least `min_available_bytes`
/// free. Falls back to `Fail` with an `unknown_mount_point` code when no disk
/// entry covers the path (e.g. the path does not exist).
pub fn check_disk_space(path: &Path, min_available_bytes: u64) -> SystemCheckResult {
    let mut system = System::new();
    system.refresh_disks_list();
    system.refresh_disks();

    let best_match = system
        .disks()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len());

    match best_match {
        Some(disk) => {
            let available = disk.available_space();
            if available >= min_available_bytes {
                SystemCheckResult::pass(
                    "check_disk_space",
                    "sufficient",
                    Some(format!("{available} bytes available on {}", disk.mount_point().display())),
                )
            } else {
                SystemCheckResult::fail(
                    "check_disk_space",
                    "insufficient",
                    Some(format!(
                        "{available} bytes available on {}, required {min_available_bytes}",
                        disk.mount_point().display()
                    )),
                )
            }
        }
        None => SystemCheckResult::fail(
            "check_disk_space",
            "unknown_mount_point",
            Some(format!("no disk entry covers {}", path.display())),
        ),
    }
}

/// Checks that at least `min_available_bytes` of system memory are available.
pub fn check_memory(min_available_bytes: u64) -> SystemCheckResult {
    let mut system = System::new();
    system.refresh_memory();
    let available = system.available_memory();
    if available >= min_available_bytes {
        SystemCheckResult::pass(
            "check_memory",
            "sufficient",
            Some(format!("{available} bytes available")),
        )
    } else {
        SystemCheckResult::fail(
            "check_memory",
            "insufficient",
            Some(format!("{available} bytes available, required {min_available_bytes}")),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{check_disk_space, check_memory, check_port, check_process, CheckStatus};

    #[test]
    fn functional_check_process_matches_current_test_runner() {
        let result = check_process("", true);
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn regression_check_process_not_running_fails_when_expected_absent_process_exists() {
        let result = check_process("", false);
        assert_eq!(result.status, CheckStatus::Fail);
    }

    #[test]
    fn unit_check_port_closed_on_unused_high_port() {
        let result = check_port("127.0.0.1", 1, 50, false);
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn functional_check_disk_space_root_mount_reports_available_bytes() {
        let result = check_disk_space(Path::new("/"), 0);
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn functional_check_memory_zero_minimum_always_passes() {
        let result = check_memory(0);
        assert_eq!(result.status, CheckStatus::Pass);
    }
}
