//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use registry_lifecycle::config::ProbeConfig;
use registry_lifecycle::health::Prober;
use registry_lifecycle::registry::{
    ApplicationView, InstanceDescriptor, InstanceKey, InstanceStatus, InstanceView,
    RegistryClient, RegistryError, RegistryResult,
};

/// Start a backend on an ephemeral loopback port answering every request
/// with the status returned by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = u16> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let status = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    status_text
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that always answers `status` immediately.
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { status }).await
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn instance(host: &str, addr: SocketAddr) -> InstanceView {
    InstanceView {
        host_name: host.to_string(),
        ip_address: addr.ip().to_string(),
        port: addr.port(),
        status: InstanceStatus::Up,
    }
}

pub fn prober(timeout_secs: u64) -> Prober {
    Prober::new(&ProbeConfig {
        timeout_secs,
        ..ProbeConfig::default()
    })
    .unwrap()
}

/// In-memory registry double with call counters and a switchable outage.
#[derive(Default)]
pub struct FakeRegistry {
    apps: Mutex<Vec<ApplicationView>>,
    leases: Mutex<Vec<InstanceKey>>,
    down: AtomicBool,
    register_delay: Mutex<Duration>,
    pub registers: AtomicUsize,
    pub heartbeats: AtomicUsize,
    pub deregisters: AtomicUsize,
    pub listings: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apps(apps: Vec<ApplicationView>) -> Self {
        let registry = Self::default();
        *registry.apps.lock().unwrap() = apps;
        registry
    }

    /// Every call fails with a transport error while set.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Delay every registration by `delay` before it takes effect.
    pub fn set_register_delay(&self, delay: Duration) {
        *self.register_delay.lock().unwrap() = delay;
    }

    /// Drop every lease, as if the registry evicted them.
    pub fn evict_all(&self) {
        self.leases.lock().unwrap().clear();
    }

    pub fn is_registered(&self, key: &InstanceKey) -> bool {
        self.leases.lock().unwrap().contains(key)
    }

    fn check_up(&self) -> RegistryResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(RegistryError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn register(&self, instance: &InstanceDescriptor) -> RegistryResult<()> {
        self.registers.fetch_add(1, Ordering::SeqCst);
        let delay = *self.register_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check_up()?;
        let key = instance.key();
        let mut leases = self.leases.lock().unwrap();
        if !leases.contains(&key) {
            leases.push(key);
        }
        Ok(())
    }

    async fn heartbeat(&self, key: &InstanceKey) -> RegistryResult<()> {
        self.heartbeats.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        if self.is_registered(key) {
            Ok(())
        } else {
            Err(RegistryError::NotRegistered(key.clone()))
        }
    }

    async fn deregister(&self, key: &InstanceKey) -> RegistryResult<()> {
        self.deregisters.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        self.leases.lock().unwrap().retain(|k| k != key);
        Ok(())
    }

    async fn list_applications(&self) -> RegistryResult<Vec<ApplicationView>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        Ok(self.apps.lock().unwrap().clone())
    }
}

/// Poll `cond` until it holds or `limit` elapses.
pub async fn wait_until<F: Fn() -> bool>(cond: F, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
