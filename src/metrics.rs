use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, IntoStaticStr};
use tracing::info;

/// Command families, used to group the per-command counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumCountMacro, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Server,
    Key,
    String,
    List,
    SortedSet,
    Hash,
    Set,
}

/// Process wide counters, created once at startup and shared through the store.
#[derive(Debug)]
pub struct Metrics {
    started_at: Instant,
    connections_received: AtomicU64,
    connections_active: AtomicU64,
    commands: [AtomicU64; Category::COUNT],
    command_errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Metrics {
        Metrics {
            started_at: Instant::now(),
            connections_received: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            commands: std::array::from_fn(|_| AtomicU64::new(0)),
            command_errors: AtomicU64::new(0),
        }
    }

    pub fn connection_opened(&self) {
        self.connections_received.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record(&self, category: Category) {
        self.commands[category as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.command_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn commands(&self, category: Category) -> u64 {
        self.commands[category as usize].load(Ordering::Relaxed)
    }

    pub fn total_commands(&self) -> u64 {
        Category::iter().map(|category| self.commands(category)).sum()
    }

    /// Renders the counters in the `INFO` reply format.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "# Server");
        let _ = writeln!(
            out,
            "uptime_in_seconds:{}",
            self.started_at.elapsed().as_secs()
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "# Clients");
        let _ = writeln!(
            out,
            "connected_clients:{}",
            self.connections_active.load(Ordering::Relaxed)
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "# Stats");
        let _ = writeln!(
            out,
            "total_connections_received:{}",
            self.connections_received.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "total_commands_processed:{}", self.total_commands());
        let _ = writeln!(
            out,
            "total_error_replies:{}",
            self.command_errors.load(Ordering::Relaxed)
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "# Commandstats");
        for category in Category::iter() {
            let name: &'static str = category.into();
            let _ = writeln!(out, "cmdstat_{}:calls={}", name, self.commands(category));
        }

        out
    }

    pub fn log_summary(&self) {
        info!(
            uptime_secs = self.started_at.elapsed().as_secs(),
            connections = self.connections_received.load(Ordering::Relaxed),
            commands = self.total_commands(),
            errors = self.command_errors.load(Ordering::Relaxed),
            "server metrics"
        );
        for category in Category::iter() {
            info!(%category, calls = self.commands(category), "command calls");
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_commands_per_category() {
        let metrics = Metrics::new();

        metrics.record(Category::List);
        metrics.record(Category::List);
        metrics.record(Category::SortedSet);

        assert_eq!(metrics.commands(Category::List), 2);
        assert_eq!(metrics.commands(Category::SortedSet), 1);
        assert_eq!(metrics.commands(Category::Hash), 0);
        assert_eq!(metrics.total_commands(), 3);
    }

    #[test]
    fn render_lists_every_category() {
        let metrics = Metrics::new();
        metrics.connection_opened();
        metrics.record(Category::Hash);

        let info = metrics.render();

        assert!(info.contains("connected_clients:1"));
        assert!(info.contains("total_connections_received:1"));
        assert!(info.contains("cmdstat_hash:calls=1"));
        assert!(info.contains("cmdstat_sorted_set:calls=0"));
    }
}
