use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use anyhow::{anyhow, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::aggregator::IpResultSet;
use crate::config::RunConfig;
use crate::metrics::{inc_failure, observe_latency};
use crate::payload::{IpGroups, ServiceEntry, ServicePlan, Target};
use crate::prober::tcp_connect::probe_tcp;
use crate::prober::{ProbeJob, ProbeResult};

pub type ServiceReport = ServiceEntry<IpResultSet>;

/// Receives progress while a run is in flight.
pub trait ProbeObserver {
    fn on_service(&self, _service: &ServicePlan) {}
    fn on_group(&self, _group: &str) {}
    /// Called as soon as a successful probe is collected.
    fn on_success(&self, group: &str, host: &str, latency_ms: f64);
    fn on_group_done(&self, _group: &str, _results: &IpResultSet) {}
}

pub struct Scheduler {
    timeout: Duration,
    concurrent: usize,
    testing_times: usize,
}

impl Scheduler {
    pub fn new(timeout: Duration, concurrent: usize, testing_times: usize) -> Result<Self> {
        if concurrent == 0 {
            return Err(anyhow!("scheduler needs at least one worker"));
        }
        Ok(Self {
            timeout,
            concurrent,
            testing_times,
        })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::new(config.timeout, config.concurrent, config.testing_times)
    }

    /// Repeat the target list `testing_times` times, then shuffle the whole
    /// sequence so probe order is independent of target identity.
    pub fn expand_jobs<R: Rng + ?Sized>(&self, targets: &[Target], rng: &mut R) -> Vec<ProbeJob> {
        let mut jobs: Vec<ProbeJob> = std::iter::repeat_n(targets, self.testing_times)
            .flatten()
            .map(|t| ProbeJob {
                host: t.host.clone(),
                port: t.port,
                timeout: self.timeout,
            })
            .collect();
        jobs.shuffle(rng);
        jobs
    }

    /// Probe one group to completion over TCP and return its samples.
    pub async fn run_group(
        &self,
        group: &str,
        targets: &[Target],
        observer: &dyn ProbeObserver,
    ) -> Result<IpResultSet> {
        self.run_group_with(group, targets, observer, probe_tcp).await
    }

    /// Run a group's jobs through `probe` on at most `concurrent` workers.
    ///
    /// Workers pull from a shared queue and push results onto a channel; the
    /// samples are only handed back once every scheduled job has reported.
    pub async fn run_group_with<P, F>(
        &self,
        group: &str,
        targets: &[Target],
        observer: &dyn ProbeObserver,
        probe: P,
    ) -> Result<IpResultSet>
    where
        P: Fn(ProbeJob) -> F + Clone + Send + 'static,
        F: Future<Output = ProbeResult> + Send + 'static,
    {
        debug!(
            "group {}: {} targets x {} rounds: {:?}",
            group,
            targets.len(),
            self.testing_times,
            targets.iter().map(|t| t.raw.as_str()).collect::<Vec<_>>()
        );
        let jobs = self.expand_jobs(targets, &mut rand::rng());
        let expected = jobs.len();
        let mut results = IpResultSet::new();
        if expected == 0 {
            debug!("group {} has nothing to probe", group);
            return Ok(results);
        }

        let queue = Arc::new(Mutex::new(jobs.into_iter()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for _ in 0..self.concurrent.min(expected) {
            let queue = queue.clone();
            let tx = tx.clone();
            let probe = probe.clone();
            workers.spawn(async move {
                loop {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some(job) = next else { break };
                    if tx.send(probe(job).await).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        for received in 0..expected {
            let result = rx.recv().await.ok_or_else(|| {
                anyhow!(
                    "probe workers for group {} stopped after {} of {} results",
                    group,
                    received,
                    expected
                )
            })?;
            match result.outcome.latency_ms() {
                Some(ms) => {
                    observe_latency(group, &result.host, ms);
                    observer.on_success(group, &result.host, ms);
                }
                None => inc_failure(group),
            }
            results.fold(result);
        }

        while let Some(joined) = workers.join_next().await {
            joined.context("probe worker panicked")?;
        }

        debug!(
            "group {}: {} hosts, {} samples",
            group,
            results.len(),
            results.total_samples()
        );
        let failures = results.failures();
        if failures > 0 {
            warn!("group {}: {} of {} probes failed", group, failures, expected);
        }
        Ok(results)
    }

    /// Probe every group of every service, one group at a time, in payload
    /// order.
    pub async fn run(
        &self,
        plan: Vec<ServicePlan>,
        observer: &dyn ProbeObserver,
    ) -> Result<Vec<ServiceReport>> {
        let mut report = Vec::with_capacity(plan.len());
        for service in plan {
            info!("probing service {:?} ({} groups)", service.title, service.ips.len());
            observer.on_service(&service);

            let ServiceEntry { domains, ips, title, extra } = service;
            let mut groups = Vec::with_capacity(ips.len());
            for (name, targets) in ips.0 {
                observer.on_group(&name);
                let results = self.run_group(&name, &targets, observer).await?;
                observer.on_group_done(&name, &results);
                groups.push((name, results));
            }

            report.push(ServiceEntry {
                domains,
                ips: IpGroups(groups),
                title,
                extra,
            });
        }
        Ok(report)
    }
}
