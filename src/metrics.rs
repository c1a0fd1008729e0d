use once_cell::sync::Lazy;
use prometheus::{Encoder, GaugeVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static LATENCY_GAUGE: Lazy<GaugeVec> = Lazy::new(|| {
    let opts = Opts::new(
        "probe_latency_milliseconds_current",
        "Most recent probe latency in milliseconds",
    );
    let gauge = GaugeVec::new(opts, &["group", "host"]).expect("valid gauge definition");
    REGISTRY.register(Box::new(gauge.clone())).expect("gauge registered once");
    gauge
});

static SUCCESS_COUNTER: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("probe_success_total", "Total number of successful probes");
    let ctr = IntCounterVec::new(opts, &["group"]).expect("valid counter definition");
    REGISTRY.register(Box::new(ctr.clone())).expect("counter registered once");
    ctr
});

static FAILURE_COUNTER: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("probe_failure_total", "Total number of failed probes");
    let ctr = IntCounterVec::new(opts, &["group"]).expect("valid counter definition");
    REGISTRY.register(Box::new(ctr.clone())).expect("counter registered once");
    ctr
});

static SUCCESS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let ctr = IntCounter::new("probe_success_all_total", "Successful probes across all groups")
        .expect("valid counter definition");
    REGISTRY.register(Box::new(ctr.clone())).expect("counter registered once");
    ctr
});

static FAILURE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let ctr = IntCounter::new("probe_failure_all_total", "Failed probes across all groups")
        .expect("valid counter definition");
    REGISTRY.register(Box::new(ctr.clone())).expect("counter registered once");
    ctr
});

pub fn observe_latency(group: &str, host: &str, latency_ms: f64) {
    LATENCY_GAUGE
        .with_label_values(&[group, host])
        .set(latency_ms);
    SUCCESS_COUNTER.with_label_values(&[group]).inc();
    SUCCESS_TOTAL.inc();
}

pub fn inc_failure(group: &str) {
    FAILURE_COUNTER.with_label_values(&[group]).inc();
    FAILURE_TOTAL.inc();
}

/// Run-wide totals as (successes, failures).
pub fn totals() -> (u64, u64) {
    (SUCCESS_TOTAL.get(), FAILURE_TOTAL.get())
}

/// Text exposition of everything recorded so far, for debug logging.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mf = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&mf, &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
