//! Plain-text rendering of daemon responses

use std::fmt::Write;

use updock_api::FleetEvent;
use updock_api::responses::{CheckUpdatesResponse, ContainerInfo, HistoryRecord, HostInfo};

const NEVER: &str = "never";

pub fn hosts(hosts: &[HostInfo]) -> String {
    if hosts.is_empty() {
        return "no hosts registered\n".to_string();
    }
    let mut out = format!("{:<30} {:>6}  {:<8} {}\n", "HOST", "PORT", "STATUS", "ADDED");
    for host in hosts {
        let _ = writeln!(
            out,
            "{:<30} {:>6}  {:<8} {}",
            host.hostname,
            host.port,
            host.status,
            host.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    out
}

/// Short form of an image ID or digest
fn short(version: Option<&str>) -> &str {
    match version {
        Some(v) => {
            let hex = v.strip_prefix("sha256:").unwrap_or(v);
            hex.get(..12).unwrap_or(hex)
        }
        None => "-",
    }
}

fn container_state(container: &ContainerInfo) -> String {
    if container.error {
        let reason = container.error_message.as_deref().unwrap_or("unknown error");
        return format!("error: {reason}");
    }
    if container.new {
        return "update available".to_string();
    }
    if container.latest {
        return "up to date".to_string();
    }
    container.status.replace('_', " ")
}

pub fn inventory(containers: &[ContainerInfo]) -> String {
    if containers.is_empty() {
        return "no containers recorded\n".to_string();
    }
    let mut out = format!(
        "{:<20} {:<24} {:<36} {:<12} {:<12} {:<16} {}\n",
        "HOST", "CONTAINER", "IMAGE", "CURRENT", "LATEST", "CHECKED", "STATE"
    );
    for c in containers {
        let checked = c
            .last_checked
            .map_or_else(|| NEVER.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let _ = writeln!(
            out,
            "{:<20} {:<24} {:<36} {:<12} {:<12} {:<16} {}",
            c.host,
            c.name,
            c.image,
            short(c.current_version.as_deref()),
            short(c.latest_version.as_deref()),
            checked,
            container_state(c)
        );
    }
    out
}

pub fn report(report: &CheckUpdatesResponse) -> String {
    let mut out = format!("{}\n", report.message);
    for r in &report.results {
        let _ = write!(
            out,
            "  {:<30} {:<8} {} containers, {} up to date, {} updates, {} errors",
            r.hostname, r.status, r.total_containers, r.up_to_date, r.updates_available, r.errors
        );
        if let Some(error) = &r.error_message {
            let _ = write!(out, " ({error})");
        }
        out.push('\n');
    }
    let s = report.stats;
    let _ = writeln!(
        out,
        "total: {} containers, {} up to date, {} updates available, {} errors",
        s.total_containers, s.up_to_date, s.updates_available, s.errors
    );
    out
}

pub fn history(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return "no checks recorded\n".to_string();
    }
    let mut out = format!(
        "{:<20} {:<30} {:<8} {:>6} {:>6} {:>6} {:>6}\n",
        "TIME", "HOST", "STATUS", "TOTAL", "OK", "NEW", "ERR"
    );
    for r in records {
        let s = &r.summary;
        let _ = writeln!(
            out,
            "{:<20} {:<30} {:<8} {:>6} {:>6} {:>6} {:>6}",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            s.hostname,
            s.status,
            s.total_containers,
            s.up_to_date,
            s.updates_available,
            s.errors
        );
    }
    out
}

pub fn event(event: &FleetEvent) -> String {
    match event {
        FleetEvent::UpdateCheckStarted { trigger, at } => {
            format!("[{}] {trigger} check started", at.format("%H:%M:%S"))
        }
        FleetEvent::UpdateCheckCompleted { trigger, stats, at } => format!(
            "[{}] {trigger} check completed: {} containers, {} updates available, {} errors",
            at.format("%H:%M:%S"),
            stats.total_containers,
            stats.updates_available,
            stats.errors
        ),
        FleetEvent::UpdateCheckFailed { trigger, error, at } => {
            format!("[{}] {trigger} check failed: {error}", at.format("%H:%M:%S"))
        }
        FleetEvent::HostRegistered { host } => format!("host {host} registered"),
        FleetEvent::HostOffline { host, reason } => format!("host {host} offline: {reason}"),
        FleetEvent::HostOnline { host } => format!("host {host} back online"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use updock_api::responses::HostCheckSummary;
    use updock_api::{CheckTrigger, FleetStats};

    use super::*;

    fn container(status: &str, latest: bool, new: bool, error: bool) -> ContainerInfo {
        ContainerInfo {
            id: 1,
            name: "web".to_string(),
            host: "nas".to_string(),
            image: "nginx:latest".to_string(),
            current_version: Some("sha256:0123456789abcdef0123".to_string()),
            latest_version: None,
            created_at: None,
            image_created: None,
            last_checked: None,
            status: status.to_string(),
            latest,
            new,
            error,
            error_message: error.then(|| "pull failed".to_string()),
        }
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(short(Some("sha256:0123456789abcdef0123")), "0123456789ab");
        assert_eq!(short(Some("abc")), "abc");
        assert_eq!(short(None), "-");
    }

    #[test]
    fn test_inventory_states() {
        let out = inventory(&[
            container("update_available", false, true, false),
            container("unknown", false, false, true),
            container("pending", false, false, false),
        ]);
        assert!(out.contains("update available"));
        assert!(out.contains("error: pull failed"));
        assert!(out.contains("pending"));
        assert!(out.contains("never"));
        assert!(out.contains("0123456789ab"));
    }

    #[test]
    fn test_report_totals() {
        let out = report(&CheckUpdatesResponse {
            message: "Update check completed".to_string(),
            results: vec![HostCheckSummary {
                hostname: "nas".to_string(),
                total_containers: 0,
                up_to_date: 0,
                updates_available: 0,
                errors: 0,
                status: "error".to_string(),
                error_message: Some("connection refused".to_string()),
            }],
            stats: FleetStats::default(),
        });
        assert!(out.contains("(connection refused)"));
        assert!(out.contains("total: 0 containers"));
    }

    #[test]
    fn test_event_lines() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap();
        let line = event(&FleetEvent::UpdateCheckStarted {
            trigger: CheckTrigger::Daily,
            at,
        });
        assert_eq!(line, "[04:00:00] daily check started");

        let line = event(&FleetEvent::HostOffline {
            host: "pi".to_string(),
            reason: "timed out".to_string(),
        });
        assert_eq!(line, "host pi offline: timed out");
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(hosts(&[]), "no hosts registered\n");
        assert_eq!(history(&[]), "no checks recorded\n");
    }
}
