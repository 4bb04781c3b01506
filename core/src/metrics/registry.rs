use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::error::MetricsError;

use super::render;
use super::types::{HistogramOptions, Options};

#[derive(Debug, Default)]
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    fn add(&self, v: f64) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + v).to_bits())
            });
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HistogramState {
    /// Per-bucket (non-cumulative) counts, one per upper bound.
    pub(crate) counts: Vec<u64>,
    pub(crate) sum: f64,
    pub(crate) count: u64,
}

#[derive(Debug)]
pub(crate) struct HistogramCell(Mutex<HistogramState>);

impl HistogramCell {
    fn new(buckets: usize) -> Self {
        Self(Mutex::new(HistogramState {
            counts: vec![0; buckets],
            sum: 0.0,
            count: 0,
        }))
    }

    pub(crate) fn state(&self) -> HistogramState {
        lock(&self.0).clone()
    }
}

/// One metric family: a name, its label names and a series per label set.
#[derive(Debug)]
pub(crate) struct Family<T> {
    pub(crate) name: String,
    pub(crate) help: String,
    pub(crate) labels: Vec<String>,
    series: Mutex<BTreeMap<Vec<String>, Arc<T>>>,
}

impl<T> Family<T> {
    fn new(name: String, opts: Options) -> Self {
        Self {
            name,
            help: opts.desc,
            labels: opts.tags,
            series: Mutex::new(BTreeMap::new()),
        }
    }

    fn series<S: AsRef<str>>(
        &self,
        values: &[S],
        make: impl FnOnce() -> T,
    ) -> Result<Arc<T>, MetricsError> {
        if values.len() != self.labels.len() {
            return Err(MetricsError::LabelMismatch {
                metric: self.name.clone(),
                expected: self.labels.len(),
                got: values.len(),
            });
        }
        let key: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        let mut series = lock(&self.series);
        Ok(series.entry(key).or_insert_with(|| Arc::new(make())).clone())
    }

    pub(crate) fn snapshot(&self) -> Vec<(Vec<String>, Arc<T>)> {
        lock(&self.series)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

pub(crate) enum Collector {
    Counter(Arc<Family<AtomicF64>>),
    Gauge(Arc<Family<AtomicF64>>),
    Histogram(Arc<Family<HistogramCell>>, Arc<[f64]>),
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of every registered metric family.
///
/// Cloning is cheap and shares the underlying families.
#[derive(Clone, Default)]
pub struct Registry {
    collectors: Arc<RwLock<BTreeMap<String, Collector>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, opts: Options) -> Result<CounterVec, MetricsError> {
        let name = opts.validate()?;
        let family = Arc::new(Family::new(name.clone(), opts));
        self.insert(name, Collector::Counter(family.clone()))?;
        Ok(CounterVec { family })
    }

    pub fn gauge(&self, opts: Options) -> Result<GaugeVec, MetricsError> {
        let name = opts.validate()?;
        let family = Arc::new(Family::new(name.clone(), opts));
        self.insert(name, Collector::Gauge(family.clone()))?;
        Ok(GaugeVec { family })
    }

    pub fn histogram(&self, opts: HistogramOptions) -> Result<HistogramVec, MetricsError> {
        let (opts, buckets) = opts.split();
        let name = opts.validate()?;
        let increasing = buckets.windows(2).all(|w| w[0] < w[1]);
        if !increasing || buckets.iter().any(|b| !b.is_finite()) {
            return Err(MetricsError::InvalidBuckets(name));
        }
        let buckets: Arc<[f64]> = buckets.into();
        let family = Arc::new(Family::new(name.clone(), opts));
        self.insert(name, Collector::Histogram(family.clone(), buckets.clone()))?;
        Ok(HistogramVec { family, buckets })
    }

    /// Registered family names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Prometheus text exposition of every family.
    pub fn render(&self) -> String {
        render::render(&self.read())
    }

    fn insert(&self, name: String, collector: Collector) -> Result<(), MetricsError> {
        let mut collectors = self
            .collectors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if collectors.contains_key(&name) {
            return Err(MetricsError::AlreadyRegistered(name));
        }
        collectors.insert(name, collector);
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Collector>> {
        self.collectors.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("families", &self.names())
            .finish()
    }
}

/// Counter family; resolve a series with [`CounterVec::with_labels`].
#[derive(Clone)]
pub struct CounterVec {
    family: Arc<Family<AtomicF64>>,
}

impl CounterVec {
    pub fn with_labels<S: AsRef<str>>(&self, values: &[S]) -> Result<Counter, MetricsError> {
        let cell = self.family.series(values, AtomicF64::default)?;
        Ok(Counter { cell })
    }
}

/// Monotonic counter for one label set.
#[derive(Clone)]
pub struct Counter {
    cell: Arc<AtomicF64>,
}

impl Counter {
    pub fn inc(&self) {
        self.cell.add(1.0);
    }

    /// Negative and NaN deltas are ignored.
    pub fn add(&self, v: f64) {
        if v.is_nan() || v < 0.0 {
            return;
        }
        self.cell.add(v);
    }

    pub fn get(&self) -> f64 {
        self.cell.get()
    }
}

#[derive(Clone, Debug)]
pub struct GaugeVec {
    family: Arc<Family<AtomicF64>>,
}

impl GaugeVec {
    pub fn with_labels<S: AsRef<str>>(&self, values: &[S]) -> Result<Gauge, MetricsError> {
        let cell = self.family.series(values, AtomicF64::default)?;
        Ok(Gauge { cell })
    }
}

#[derive(Clone)]
pub struct Gauge {
    cell: Arc<AtomicF64>,
}

impl Gauge {
    pub fn set(&self, v: f64) {
        self.cell.set(v);
    }

    pub fn inc(&self) {
        self.cell.add(1.0);
    }

    pub fn dec(&self) {
        self.cell.add(-1.0);
    }

    pub fn add(&self, v: f64) {
        self.cell.add(v);
    }

    pub fn get(&self) -> f64 {
        self.cell.get()
    }
}

#[derive(Clone)]
pub struct HistogramVec {
    family: Arc<Family<HistogramCell>>,
    buckets: Arc<[f64]>,
}

impl HistogramVec {
    pub fn with_labels<S: AsRef<str>>(&self, values: &[S]) -> Result<Histogram, MetricsError> {
        let len = self.buckets.len();
        let cell = self.family.series(values, || HistogramCell::new(len))?;
        Ok(Histogram {
            cell,
            buckets: self.buckets.clone(),
        })
    }
}

#[derive(Clone)]
pub struct Histogram {
    cell: Arc<HistogramCell>,
    buckets: Arc<[f64]>,
}

impl Histogram {
    pub fn observe(&self, v: f64) {
        let bucket = self.buckets.iter().position(|bound| v <= *bound);
        let mut state = lock(&self.cell.0);
        if let Some(i) = bucket {
            state.counts[i] += 1;
        }
        state.sum += v;
        state.count += 1;
    }

    pub fn count(&self) -> u64 {
        lock(&self.cell.0).count
    }

    pub fn sum(&self) -> f64 {
        lock(&self.cell.0).sum
    }
}
