use std::collections::BTreeMap;
use std::fmt::Write;

use super::registry::{AtomicF64, Collector, Family, HistogramCell};

pub(crate) fn render(collectors: &BTreeMap<String, Collector>) -> String {
    let mut out = String::new();
    for collector in collectors.values() {
        match collector {
            Collector::Counter(family) => write_scalar(&mut out, "counter", family),
            Collector::Gauge(family) => write_scalar(&mut out, "gauge", family),
            Collector::Histogram(family, buckets) => write_histogram(&mut out, family, buckets),
        }
    }
    out
}

fn write_header<T>(out: &mut String, kind: &str, family: &Family<T>) {
    let _ = writeln!(out, "# HELP {} {}", family.name, escape_help(&family.help));
    let _ = writeln!(out, "# TYPE {} {}", family.name, kind);
}

fn write_scalar(out: &mut String, kind: &str, family: &Family<AtomicF64>) {
    write_header(out, kind, family);
    for (values, cell) in family.snapshot() {
        let labels = label_set(&family.labels, &values, None);
        let _ = writeln!(out, "{}{} {}", family.name, labels, fmt_value(cell.get()));
    }
}

fn write_histogram(out: &mut String, family: &Family<HistogramCell>, buckets: &[f64]) {
    write_header(out, "histogram", family);
    for (values, cell) in family.snapshot() {
        let state = cell.state();
        let mut cumulative = 0u64;
        for (bound, count) in buckets.iter().zip(&state.counts) {
            cumulative += count;
            let le = fmt_value(*bound);
            let labels = label_set(&family.labels, &values, Some(("le", &le)));
            let _ = writeln!(out, "{}_bucket{} {}", family.name, labels, cumulative);
        }
        let labels = label_set(&family.labels, &values, Some(("le", "+Inf")));
        let _ = writeln!(out, "{}_bucket{} {}", family.name, labels, state.count);

        let labels = label_set(&family.labels, &values, None);
        let _ = writeln!(out, "{}_sum{} {}", family.name, labels, fmt_value(state.sum));
        let _ = writeln!(out, "{}_count{} {}", family.name, labels, state.count);
    }
}

fn label_set(names: &[String], values: &[String], extra: Option<(&str, &str)>) -> String {
    let mut pairs: Vec<String> = names
        .iter()
        .zip(values)
        .map(|(n, v)| format!("{n}=\"{}\"", escape_label(v)))
        .collect();
    if let Some((n, v)) = extra {
        pairs.push(format!("{n}=\"{v}\""));
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}
