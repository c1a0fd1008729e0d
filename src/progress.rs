use std::io::Write;

use crate::aggregator::IpResultSet;
use crate::payload::ServicePlan;
use crate::scheduler::ProbeObserver;

/// Prints the run to a writer (stdout in the binary) as it happens.
/// Failed attempts are not listed one by one; a group with failures gets a
/// single count line once it drains.
pub struct ConsoleProgress<W: Write> {
    out: std::sync::Mutex<W>,
}

impl ConsoleProgress<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: std::sync::Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn line(&self, text: std::fmt::Arguments) {
        let mut out = self.out.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        // Progress output is best effort; a closed pipe must not abort a run.
        let _ = writeln!(out, "{}", text);
    }
}

pub fn success_line(host: &str, latency_ms: f64) -> String {
    format!("\t\t{:<15}\t{:?}ms", host, latency_ms)
}

impl<W: Write> ProbeObserver for ConsoleProgress<W> {
    fn on_service(&self, service: &ServicePlan) {
        self.line(format_args!("{}", service.title));
        self.line(format_args!("{}", service.domains.join(", ")));
    }

    fn on_group(&self, group: &str) {
        self.line(format_args!("\t{}", group));
    }

    fn on_success(&self, _group: &str, host: &str, latency_ms: f64) {
        self.line(format_args!("{}", success_line(host, latency_ms)));
    }

    fn on_group_done(&self, _group: &str, results: &IpResultSet) {
        if results.is_empty() {
            self.line(format_args!("\t\t(nothing probed)"));
            return;
        }
        let failures = results.failures();
        if failures > 0 {
            self.line(format_args!(
                "\t\t({} of {} probes failed)",
                failures,
                results.total_samples()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_payload;
    use crate::prober::{ProbeOutcome, ProbeResult};
    use std::path::Path;

    #[test]
    fn success_line_pads_host() {
        assert_eq!(success_line("1.2.3.4", 12.5), "\t\t1.2.3.4        \t12.5ms");
    }

    #[test]
    fn whole_millisecond_keeps_fraction() {
        assert_eq!(success_line("1.2.3.4", 3.0), "\t\t1.2.3.4        \t3.0ms");
        assert_eq!(success_line("1.2.3.4", 0.25), "\t\t1.2.3.4        \t0.25ms");
    }

    #[test]
    fn prints_service_header_and_failure_count() {
        let plan = parse_payload(
            Path::new("inline"),
            r#"[{"title":"苹果","domains":["a.example","b.example"],"ips":{"g":[]}}]"#,
        )
        .unwrap();
        let progress = ConsoleProgress::new(Vec::new());

        progress.on_service(&plan[0]);
        progress.on_group("g");
        progress.on_success("g", "10.0.0.1", 3.0);
        let results: IpResultSet = vec![
            ProbeResult {
                host: "10.0.0.1".into(),
                outcome: ProbeOutcome::Success(3.0),
            },
            ProbeResult {
                host: "10.0.0.2".into(),
                outcome: ProbeOutcome::Failure,
            },
        ]
        .into_iter()
        .collect();
        progress.on_group_done("g", &results);

        let text = String::from_utf8(progress.into_inner()).unwrap();
        assert_eq!(
            text,
            "苹果\na.example, b.example\n\tg\n\t\t10.0.0.1       \t3.0ms\n\t\t(1 of 2 probes failed)\n"
        );
    }
}
