use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sparkpanel_monitor::snapshot::{
    ApplicationReading, CpuReading, DiskReading, MemoryReading, NetworkReading,
};
use sparkpanel_monitor::{MetricsSource, Snapshot};

/// Snapshot with the given percentages and tick rate, stamped now
pub fn snapshot_with(cpu: f64, memory: f64, disk: f64, tick_rate: f64) -> Snapshot {
    Snapshot {
        timestamp: Utc::now(),
        cpu: CpuReading {
            percent: cpu,
            cores: 4,
            frequency_mhz: 3000,
        },
        memory: MemoryReading {
            total_bytes: 16 * 1024 * 1024 * 1024,
            available_bytes: 8 * 1024 * 1024 * 1024,
            used_bytes: 8 * 1024 * 1024 * 1024,
            percent: memory,
        },
        disk: DiskReading {
            total_bytes: 500 * 1024 * 1024 * 1024,
            used_bytes: 250 * 1024 * 1024 * 1024,
            free_bytes: 250 * 1024 * 1024 * 1024,
            percent: disk,
        },
        network: NetworkReading::default(),
        application: ApplicationReading {
            online: true,
            players_online: 12,
            players_max: 20,
            tick_rate,
            uptime_secs: 3600,
            chunks_loaded: 1250,
            entities: 450,
        },
    }
}

/// Returns the same readings on every call and counts calls
pub struct StubSource {
    cpu: f64,
    memory: f64,
    disk: f64,
    tick_rate: f64,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new(cpu: f64, memory: f64, disk: f64, tick_rate: f64) -> Self {
        Self {
            cpu,
            memory,
            disk,
            tick_rate,
            calls: AtomicUsize::new(0),
        }
    }

    /// Readings that never cross the default thresholds
    pub fn quiet() -> Self {
        Self::new(10.0, 20.0, 30.0, 20.0)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for StubSource {
    async fn collect(&self) -> Snapshot {
        self.calls.fetch_add(1, Ordering::SeqCst);
        snapshot_with(self.cpu, self.memory, self.disk, self.tick_rate)
    }
}

pub enum Step {
    Emit(Snapshot),
    Panic(&'static str),
}

/// Plays back a script, then repeats the fallback readings
pub struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    fallback: StubSource,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>, fallback: StubSource) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            fallback,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl MetricsSource for ScriptedSource {
    async fn collect(&self) -> Snapshot {
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Emit(snapshot)) => snapshot,
            Some(Step::Panic(reason)) => panic!("{}", reason),
            None => self.fallback.collect().await,
        }
    }
}

/// Wraps a stub and sleeps before every collection
pub struct SlowSource {
    delay: Duration,
    inner: StubSource,
    finished: AtomicUsize,
}

impl SlowSource {
    pub fn new(delay: Duration, inner: StubSource) -> Self {
        Self {
            delay,
            inner,
            finished: AtomicUsize::new(0),
        }
    }

    pub fn started(&self) -> usize {
        self.inner.calls()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for SlowSource {
    async fn collect(&self) -> Snapshot {
        let snapshot = self.inner.collect().await;
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        snapshot
    }
}
