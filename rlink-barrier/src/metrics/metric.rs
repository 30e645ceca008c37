use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use ::metrics::{counter, gauge};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag(String, String);

impl Tag {
    pub fn new<F, C>(field: F, context: C) -> Self
    where
        F: ToString,
        C: ToString,
    {
        Tag(field.to_string(), context.to_string())
    }
}

struct CounterMeta {
    name: String,
    tags: Vec<Tag>,
    old_value: AtomicU64,
    value: Arc<AtomicU64>,
}

struct GaugeMeta {
    name: String,
    tags: Vec<Tag>,
    value: Arc<AtomicI64>,
}

lazy_static! {
    static ref COUNTER: RwLock<Vec<CounterMeta>> = RwLock::new(Vec::new());
    static ref GAUGE: RwLock<Vec<GaugeMeta>> = RwLock::new(Vec::new());
}

#[derive(Clone, Default, Debug)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    fn new(value: Arc<AtomicU64>) -> Self {
        Counter { value }
    }

    pub fn fetch_add(&self, v: u64) -> u64 {
        self.value.fetch_add(v, Ordering::Relaxed)
    }

    pub fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Default, Debug)]
pub struct Gauge {
    value: Arc<AtomicI64>,
}

impl Gauge {
    fn new(value: Arc<AtomicI64>) -> Self {
        Gauge { value }
    }

    pub fn store(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn fetch_add(&self, v: i64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    pub fn fetch_sub(&self, v: i64) {
        self.value.fetch_sub(v, Ordering::Relaxed);
    }

    pub fn load(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

pub fn register_counter<K>(name: K, tags: Vec<Tag>) -> Counter
where
    K: ToString,
{
    let value = Arc::new(AtomicU64::new(0));
    let meta = CounterMeta {
        name: name.to_string(),
        tags,
        old_value: AtomicU64::new(0),
        value: value.clone(),
    };

    match COUNTER.write() {
        Ok(mut metrics) => metrics.push(meta),
        Err(e) => error!("counter registry poisoned, `{}` is not reported. {}", meta.name, e),
    }

    Counter::new(value)
}

pub fn register_gauge<K>(name: K, tags: Vec<Tag>) -> Gauge
where
    K: ToString,
{
    let value = Arc::new(AtomicI64::new(0));
    let meta = GaugeMeta {
        name: name.to_string(),
        tags,
        value: value.clone(),
    };

    match GAUGE.write() {
        Ok(mut metrics) => metrics.push(meta),
        Err(e) => error!("gauge registry poisoned, `{}` is not reported. {}", meta.name, e),
    }

    Gauge::new(value)
}

/// Publish every registered metric through the `metrics` facade.
/// Counters are reported as the increment since the previous call.
pub fn compute() {
    compute_counter();
    compute_gauge();
}

fn labels(tags: &[Tag]) -> Vec<(String, String)> {
    tags.iter()
        .map(|tag| (tag.0.clone(), tag.1.clone()))
        .collect()
}

fn compute_counter() {
    let metrics = match COUNTER.read() {
        Ok(metrics) => metrics,
        Err(_e) => return,
    };
    for meta in &*metrics {
        let name = meta.name.clone();

        let value: u64 = meta.value.load(Ordering::Relaxed);
        let old_value: u64 = meta.old_value.swap(value, Ordering::Relaxed);
        let incr = value.saturating_sub(old_value);

        let labels = labels(meta.tags.as_slice());
        counter!(name, incr, &labels);
    }
}

fn compute_gauge() {
    let metrics = match GAUGE.read() {
        Ok(metrics) => metrics,
        Err(_e) => return,
    };
    for meta in &*metrics {
        let name = meta.name.clone();

        let labels = labels(meta.tags.as_slice());
        let val = meta.value.load(Ordering::Relaxed) as f64;
        gauge!(name, val, &labels);
    }
}

#[cfg(test)]
mod tests {
    use crate::metrics::metric::{compute, register_counter, register_gauge, Tag};

    #[test]
    pub fn register_metric_test() {
        let counter = register_counter("Test.Counter", vec![Tag::new("node", "n1")]);
        let gauge = register_gauge("Test.Gauge", vec![]);

        counter.fetch_add(3);
        gauge.fetch_add(2);
        gauge.fetch_sub(1);
        assert_eq!(counter.load(), 3);
        assert_eq!(gauge.load(), 1);

        // no recorder installed, publishing is a no-op
        compute();
        assert_eq!(counter.load(), 3);
    }
}
