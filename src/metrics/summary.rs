//! Labelled summary metric
//!
//! Tracks count and sum per label set, plus quantiles over a sliding time
//! window. The window is split into `age_buckets` buckets of equal width; the
//! newest bucket receives observations and the oldest one is dropped once the
//! window has moved past it, so quantiles describe roughly the last `max_age`.
//! Count and sum are cumulative.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::fmt::Write;
use std::time::{Duration, Instant};

use super::labels::{
    QUANTILE_LABEL, format_float, is_valid_metric_name, render_label_pairs, validate_label_names,
};
use crate::errors::{ReqmeterError, Result};

/// Upper bound on the number of age buckets in a sliding window.
pub const MAX_AGE_BUCKETS: usize = 60;

/// Options for a [`SummaryVec`].
#[derive(Debug, Clone)]
pub struct SummaryOpts {
    pub name: String,
    pub help: String,
    pub label_names: Vec<String>,
    pub quantiles: Vec<f64>,
    pub max_age: Duration,
    pub age_buckets: usize,
    pub max_samples_per_bucket: usize,
}

impl SummaryOpts {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, help: S2) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
            quantiles: vec![0.5, 0.9, 0.99],
            max_age: Duration::from_secs(600),
            age_buckets: 5,
            max_samples_per_bucket: 2048,
        }
    }

    pub fn label_names(mut self, names: &[&str]) -> Self {
        self.label_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn quantiles(mut self, quantiles: Vec<f64>) -> Self {
        self.quantiles = quantiles;
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn age_buckets(mut self, age_buckets: usize) -> Self {
        self.age_buckets = age_buckets;
        self
    }

    pub fn max_samples_per_bucket(mut self, max_samples: usize) -> Self {
        self.max_samples_per_bucket = max_samples;
        self
    }

    fn validate(&self) -> Result<()> {
        if !is_valid_metric_name(&self.name) {
            return Err(ReqmeterError::invalid_labels(format!(
                "invalid metric name '{}'",
                self.name
            )));
        }
        validate_label_names(&self.name, &self.label_names, &[QUANTILE_LABEL])?;

        if let Some(q) = self.quantiles.iter().find(|q| !(**q > 0.0 && **q < 1.0)) {
            return Err(ReqmeterError::config(format!(
                "summary '{}' has quantile {} outside (0, 1)",
                self.name, q
            )));
        }
        if self.age_buckets > MAX_AGE_BUCKETS {
            return Err(ReqmeterError::config(format!(
                "summary '{}' allows at most {} age buckets, got {}",
                self.name, MAX_AGE_BUCKETS, self.age_buckets
            )));
        }
        if self.max_age.is_zero() || self.age_buckets == 0 || self.max_samples_per_bucket == 0 {
            return Err(ReqmeterError::config(format!(
                "summary '{}' needs a positive max_age, age_buckets and max_samples_per_bucket",
                self.name
            )));
        }
        Ok(())
    }
}

/// Point-in-time view of one summary series.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySnapshot {
    pub count: u64,
    pub sum: f64,
    /// `(quantile, value)` pairs in configured order; `NaN` when the window is empty.
    pub quantiles: Vec<(f64, f64)>,
}

struct AgeBucket {
    start: Instant,
    samples: Vec<f64>,
    seen: usize,
}

impl AgeBucket {
    fn new(start: Instant) -> Self {
        Self {
            start,
            samples: Vec::new(),
            seen: 0,
        }
    }
}

struct SlidingWindow {
    buckets: VecDeque<AgeBucket>,
    width: Duration,
    max_age: Duration,
    age_buckets: usize,
    max_samples: usize,
}

impl SlidingWindow {
    fn new(max_age: Duration, age_buckets: usize, max_samples: usize) -> Self {
        // 1..=MAX_AGE_BUCKETS, checked in SummaryOpts::validate
        let divisor = u32::try_from(age_buckets).unwrap_or(u32::MAX).max(1);
        let width = max_age / divisor;
        Self {
            buckets: VecDeque::with_capacity(age_buckets),
            width: width.max(Duration::from_nanos(1)),
            max_age,
            age_buckets,
            max_samples,
        }
    }

    /// Advance so that the newest bucket covers `now`.
    fn rotate(&mut self, now: Instant) {
        let Some(head_start) = self.buckets.back().map(|b| b.start) else {
            self.buckets.push_back(AgeBucket::new(now));
            return;
        };

        let elapsed = now.saturating_duration_since(head_start);
        if elapsed < self.width {
            return;
        }

        let steps = (elapsed.as_nanos() / self.width.as_nanos()) as usize;
        if steps >= self.age_buckets {
            self.buckets.clear();
            self.buckets.push_back(AgeBucket::new(now));
            return;
        }

        for i in 1..=steps {
            self.buckets
                .push_back(AgeBucket::new(head_start + self.width * i as u32));
        }
        while self.buckets.len() > self.age_buckets {
            self.buckets.pop_front();
        }
    }

    fn observe(&mut self, value: f64, now: Instant) {
        self.rotate(now);
        let max_samples = self.max_samples;
        if let Some(bucket) = self.buckets.back_mut() {
            if bucket.samples.len() < max_samples {
                bucket.samples.push(value);
            } else {
                // 桶已满：循环覆盖最早的样本
                let slot = bucket.seen % max_samples;
                bucket.samples[slot] = value;
            }
            bucket.seen += 1;
        }
    }

    /// Samples still inside the window at `now`, sorted ascending.
    fn live_samples(&self, now: Instant) -> Vec<f64> {
        let mut samples: Vec<f64> = self
            .buckets
            .iter()
            .filter(|b| now.saturating_duration_since(b.start) < self.max_age)
            .flat_map(|b| b.samples.iter().copied())
            .collect();
        samples.sort_by(|a, b| a.total_cmp(b));
        samples
    }
}

/// Nearest-rank quantile of an ascending slice.
fn quantile_of(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

struct Series {
    count: u64,
    sum: f64,
    window: SlidingWindow,
}

/// Summary partitioned by a fixed, ordered set of label names.
pub struct SummaryVec {
    opts: SummaryOpts,
    series: DashMap<Vec<String>, Series>,
}

impl SummaryVec {
    pub fn new(opts: SummaryOpts) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            series: DashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.opts.name
    }

    pub fn label_names(&self) -> &[String] {
        &self.opts.label_names
    }

    /// Number of label sets observed so far.
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Record `value` for the series identified by `label_values`.
    pub fn observe(&self, label_values: &[&str], value: f64) -> Result<()> {
        self.observe_at(label_values, value, Instant::now())
    }

    pub(crate) fn observe_at(&self, label_values: &[&str], value: f64, now: Instant) -> Result<()> {
        let key = self.key(label_values)?;
        let mut series = self.series.entry(key).or_insert_with(|| Series {
            count: 0,
            sum: 0.0,
            window: SlidingWindow::new(
                self.opts.max_age,
                self.opts.age_buckets,
                self.opts.max_samples_per_bucket,
            ),
        });
        series.count += 1;
        series.sum += value;
        series.window.observe(value, now);
        Ok(())
    }

    pub fn snapshot(&self, label_values: &[&str]) -> Option<SummarySnapshot> {
        self.snapshot_at(label_values, Instant::now())
    }

    pub(crate) fn snapshot_at(&self, label_values: &[&str], now: Instant) -> Option<SummarySnapshot> {
        let key = self.key(label_values).ok()?;
        let series = self.series.get(&key)?;
        Some(self.snapshot_series(&series, now))
    }

    fn snapshot_series(&self, series: &Series, now: Instant) -> SummarySnapshot {
        let samples = series.window.live_samples(now);
        SummarySnapshot {
            count: series.count,
            sum: series.sum,
            quantiles: self
                .opts
                .quantiles
                .iter()
                .map(|q| (*q, quantile_of(&samples, *q)))
                .collect(),
        }
    }

    fn key(&self, label_values: &[&str]) -> Result<Vec<String>> {
        if label_values.len() != self.opts.label_names.len() {
            return Err(ReqmeterError::invalid_labels(format!(
                "metric '{}' expects {} label values ({}), got {}",
                self.opts.name,
                self.opts.label_names.len(),
                self.opts.label_names.join(","),
                label_values.len()
            )));
        }
        Ok(label_values.iter().map(|v| v.to_string()).collect())
    }

    /// Render in Prometheus text exposition format. Writes nothing when empty.
    pub fn render(&self, out: &mut String) {
        let now = Instant::now();

        let mut snapshots: Vec<(Vec<String>, SummarySnapshot)> = self
            .series
            .iter()
            .map(|entry| (entry.key().clone(), self.snapshot_series(entry.value(), now)))
            .collect();
        if snapshots.is_empty() {
            return;
        }
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));

        let name = &self.opts.name;
        let _ = writeln!(out, "# HELP {} {}", name, escape_help(&self.opts.help));
        let _ = writeln!(out, "# TYPE {} summary", name);

        for (values, snapshot) in &snapshots {
            let pairs: Vec<(&str, &str)> = self
                .opts
                .label_names
                .iter()
                .map(String::as_str)
                .zip(values.iter().map(String::as_str))
                .collect();

            for (q, v) in &snapshot.quantiles {
                let q_str = format_float(*q);
                let mut with_quantile = pairs.clone();
                with_quantile.push((QUANTILE_LABEL, q_str.as_str()));
                let _ = writeln!(
                    out,
                    "{}{} {}",
                    name,
                    render_label_pairs(&with_quantile),
                    format_float(*v)
                );
            }

            let labels = render_label_pairs(&pairs);
            let _ = writeln!(out, "{}_sum{} {}", name, labels, format_float(snapshot.sum));
            let _ = writeln!(out, "{}_count{} {}", name, labels, snapshot.count);
        }
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
