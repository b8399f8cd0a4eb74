//! Process-level default metrics
//!
//! Memory, CPU time and start time are read from sysinfo by a background task
//! that also measures runtime lag: how late the task's timer tick actually ran
//! compared to when it was scheduled.

use parking_lot::Mutex;
use prometheus::core::Collector;
use prometheus::{Counter, Gauge, Opts, Registry};
use std::sync::Weak;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace};

use super::labels::metric_name;
use crate::errors::{ReqmeterError, Result};

pub struct ProcessCollector {
    system: Mutex<System>,
    pid: Pid,
    created_at: Instant,
    resident_memory_bytes: Gauge,
    virtual_memory_bytes: Gauge,
    cpu_seconds_total: Counter,
    start_time_seconds: Gauge,
    uptime_seconds: Gauge,
    runtime_lag_seconds: Gauge,
}

impl ProcessCollector {
    pub fn new(namespace: &str) -> Result<Self> {
        let resident_memory_bytes = Gauge::with_opts(Opts::new(
            "process_resident_memory_bytes",
            "Resident memory size in bytes",
        ))?;
        let virtual_memory_bytes = Gauge::with_opts(Opts::new(
            "process_virtual_memory_bytes",
            "Virtual memory size in bytes",
        ))?;
        let cpu_seconds_total = Counter::with_opts(Opts::new(
            "process_cpu_seconds_total",
            "Total user and system CPU time spent in seconds",
        ))?;
        let start_time_seconds = Gauge::with_opts(Opts::new(
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds",
        ))?;
        let uptime_seconds = Gauge::with_opts(Opts::new(
            metric_name(namespace, "uptime_seconds"),
            "Seconds since the metrics collector was created",
        ))?;
        let runtime_lag_seconds = Gauge::with_opts(Opts::new(
            metric_name(namespace, "runtime_lag_seconds"),
            "Delay between a scheduled timer tick and its execution on the async runtime",
        ))?;

        // sysinfo 拿不到进程启动时间时，先用当前时间兜底
        start_time_seconds.set(chrono::Utc::now().timestamp() as f64);

        Ok(Self {
            system: Mutex::new(System::new()),
            pid: Pid::from_u32(std::process::id()),
            created_at: Instant::now(),
            resident_memory_bytes,
            virtual_memory_bytes,
            cpu_seconds_total,
            start_time_seconds,
            uptime_seconds,
            runtime_lag_seconds,
        })
    }

    fn collectors(&self) -> Vec<Box<dyn Collector>> {
        vec![
            Box::new(self.resident_memory_bytes.clone()),
            Box::new(self.virtual_memory_bytes.clone()),
            Box::new(self.cpu_seconds_total.clone()),
            Box::new(self.start_time_seconds.clone()),
            Box::new(self.uptime_seconds.clone()),
            Box::new(self.runtime_lag_seconds.clone()),
        ]
    }

    /// Register every process metric, rolling back on the first failure.
    pub fn register(&self, registry: &Registry) -> Result<()> {
        for (i, collector) in self.collectors().into_iter().enumerate() {
            if let Err(e) = registry.register(collector) {
                for done in self.collectors().into_iter().take(i) {
                    let _ = registry.unregister(done);
                }
                return Err(ReqmeterError::metric_registration(format!(
                    "failed to register process metrics: {}",
                    e
                )));
            }
        }
        Ok(())
    }

    /// Read the current process from the OS.
    pub fn refresh(&self) {
        let mut sys = self.system.lock();

        // Refresh only the current process
        sys.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        if let Some(process) = sys.process(self.pid) {
            self.resident_memory_bytes.set(process.memory() as f64);
            self.virtual_memory_bytes.set(process.virtual_memory() as f64);

            // accumulated_cpu_time 单位为毫秒，counter 只能递增
            let cpu_seconds = process.accumulated_cpu_time() as f64 / 1000.0;
            let delta = cpu_seconds - self.cpu_seconds_total.get();
            if delta > 0.0 {
                self.cpu_seconds_total.inc_by(delta);
            }

            let start_time = process.start_time();
            if start_time > 0 {
                self.start_time_seconds.set(start_time as f64);
            }
        } else {
            debug!(pid = %self.pid, "Current process not found by sysinfo");
        }

        self.update_uptime();
    }

    pub fn update_uptime(&self) {
        self.uptime_seconds
            .set(self.created_at.elapsed().as_secs_f64());
    }

    pub fn record_lag(&self, lag: Duration) {
        self.runtime_lag_seconds.set(lag.as_secs_f64());
    }

    pub fn runtime_lag_seconds(&self) -> f64 {
        self.runtime_lag_seconds.get()
    }

    pub fn resident_memory_bytes(&self) -> f64 {
        self.resident_memory_bytes.get()
    }
}

/// Spawn the periodic refresher on the current tokio runtime.
///
/// The task only holds a weak reference and ends once the collector is dropped.
pub fn spawn_refresher(collector: Weak<ProcessCollector>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let scheduled = ticker.tick().await;
            let Some(collector) = collector.upgrade() else {
                debug!("Process collector dropped, stopping refresher");
                break;
            };
            let lag = tokio::time::Instant::now().saturating_duration_since(scheduled);
            collector.record_lag(lag);
            collector.refresh();
            trace!(lag_ms = lag.as_secs_f64() * 1000.0, "Process metrics refreshed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice_fails_cleanly() {
        let registry = Registry::new();
        let collector = ProcessCollector::new("test").unwrap();
        collector.register(&registry).unwrap();

        let err = collector.register(&registry).unwrap_err();
        assert_eq!(err.code(), "E002");
        assert_eq!(registry.gather().len(), 6);
    }

    #[test]
    fn test_refresh_reads_current_process() {
        let collector = ProcessCollector::new("test").unwrap();
        collector.refresh();
        assert!(collector.resident_memory_bytes() > 0.0);
    }

    #[test]
    fn test_record_lag() {
        let collector = ProcessCollector::new("").unwrap();
        collector.record_lag(Duration::from_millis(250));
        assert_eq!(collector.runtime_lag_seconds(), 0.25);
    }

    #[tokio::test]
    async fn test_refresher_stops_when_collector_dropped() {
        let collector = std::sync::Arc::new(ProcessCollector::new("test").unwrap());
        let handle = spawn_refresher(
            std::sync::Arc::downgrade(&collector),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(collector);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("refresher should exit")
            .expect("refresher should not panic");
    }
}
