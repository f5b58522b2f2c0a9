//! System bus collaborator surface: request/response calls, name-ownership
//! queries, and signal subscriptions, plus an in-memory bus for tests and
//! non-transport contexts.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("service name {0} is unknown to the bus")]
    ServiceUnknown(String),
    #[error("service {0} is no longer available")]
    ServiceUnavailable(String),
    #[error("call to {method} failed: {reason}")]
    CallFailed { method: String, reason: String },
}

pub type BusResult<T> = Result<T, BusError>;

/// Addressing triple for a request/response call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallAddress {
    pub service: String,
    pub path: String,
    pub interface: String,
}

impl CallAddress {
    pub fn new(
        service: impl Into<String>,
        path: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
            interface: interface.into(),
        }
    }
}

/// Subscription rule. A `path` of `None` matches signals from any object
/// path of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalMatch {
    pub signal: String,
    pub interface: String,
    pub service: String,
    pub path: Option<String>,
}

impl SignalMatch {
    pub fn new(
        signal: impl Into<String>,
        interface: impl Into<String>,
        service: impl Into<String>,
        path: Option<String>,
    ) -> Self {
        Self {
            signal: signal.into(),
            interface: interface.into(),
            service: service.into(),
            path,
        }
    }

    fn matches(&self, service: &str, event: &SignalEvent) -> bool {
        if self.service != service || self.signal != event.signal || self.interface != event.interface
        {
            return false;
        }
        match &self.path {
            Some(path) => path == &event.path,
            None => true,
        }
    }
}

/// One delivered signal: name, originating interface and object path, and
/// the positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub signal: String,
    pub interface: String,
    pub path: String,
    pub args: Vec<Value>,
}

/// Connection to a system-wide message bus.
///
/// Calls are simple call-and-wait request/response exchanges; subscriptions
/// persist until the handle is torn down and forward matching signals into
/// the sink the subscriber supplied.
#[async_trait]
pub trait SystemBus: Send + Sync {
    /// Whether `service` currently has an owner on the bus.
    async fn owns_name(&self, service: &str) -> bool;

    /// Invoke `method` on the object addressed by `addr`.
    async fn call(&self, addr: &CallAddress, method: &str, args: &[Value]) -> BusResult<Vec<Value>>;

    /// Forward every signal matching `rule` into `sink`, in delivery order.
    fn subscribe(&self, rule: SignalMatch, sink: UnboundedSender<SignalEvent>);
}

type MethodHandler = Box<dyn Fn(&[Value]) -> BusResult<Vec<Value>> + Send + Sync>;

/// In-memory bus for tests and in-process wiring.
///
/// Tests script it by marking names owned or activatable, registering
/// method handlers, and emitting signals; emission fans out synchronously
/// to matching subscribers in registration order.
#[derive(Default)]
pub struct LocalBus {
    names: RwLock<HashSet<String>>,
    activatable: RwLock<HashSet<String>>,
    vanished: RwLock<HashSet<String>>,
    methods: RwLock<HashMap<(CallAddress, String), MethodHandler>>,
    subscriptions: RwLock<Vec<(SignalMatch, UnboundedSender<SignalEvent>)>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as currently owned.
    pub fn add_owned_name(&self, name: &str) {
        self.names.write().insert(name.to_string());
        self.vanished.write().remove(name);
    }

    /// Drop ownership of `name`; subsequent calls fail with
    /// [`BusError::ServiceUnavailable`].
    pub fn drop_name(&self, name: &str) {
        self.names.write().remove(name);
        self.vanished.write().insert(name.to_string());
    }

    /// Mark `name` as activatable: the first call addressed to it starts
    /// the service and grants it the name.
    pub fn add_activatable_name(&self, name: &str) {
        self.activatable.write().insert(name.to_string());
    }

    /// Register a handler for `method` on the object addressed by `addr`.
    pub fn register_method<F>(&self, addr: &CallAddress, method: &str, handler: F)
    where
        F: Fn(&[Value]) -> BusResult<Vec<Value>> + Send + Sync + 'static,
    {
        self.methods
            .write()
            .insert((addr.clone(), method.to_string()), Box::new(handler));
    }

    /// Deliver `event` as emitted by `service` to every matching
    /// subscriber. Subscriptions whose sink has been dropped are pruned.
    pub fn emit(&self, service: &str, event: SignalEvent) {
        let mut subscriptions = self.subscriptions.write();
        subscriptions.retain(|(rule, sink)| {
            if !rule.matches(service, &event) {
                return true;
            }
            sink.send(event.clone()).is_ok()
        });
    }

    fn ensure_running(&self, service: &str) -> BusResult<()> {
        if self.names.read().contains(service) {
            return Ok(());
        }
        if self.activatable.read().contains(service) {
            self.names.write().insert(service.to_string());
            return Ok(());
        }
        if self.vanished.read().contains(service) {
            return Err(BusError::ServiceUnavailable(service.to_string()));
        }
        Err(BusError::ServiceUnknown(service.to_string()))
    }
}

#[async_trait]
impl SystemBus for LocalBus {
    async fn owns_name(&self, service: &str) -> bool {
        self.names.read().contains(service)
    }

    async fn call(&self, addr: &CallAddress, method: &str, args: &[Value]) -> BusResult<Vec<Value>> {
        self.ensure_running(&addr.service)?;
        let methods = self.methods.read();
        match methods.get(&(addr.clone(), method.to_string())) {
            Some(handler) => handler(args),
            // Every running service answers a peer ping.
            None if method == "Ping" => Ok(Vec::new()),
            None => Err(BusError::CallFailed {
                method: method.to_string(),
                reason: format!("no handler at {}:{}", addr.path, addr.interface),
            }),
        }
    }

    fn subscribe(&self, rule: SignalMatch, sink: UnboundedSender<SignalEvent>) {
        self.subscriptions.write().push((rule, sink));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn addr() -> CallAddress {
        CallAddress::new("org.example.Svc", "/org/example/Svc", "org.example.Svc")
    }

    #[tokio::test]
    async fn call_reaches_registered_handler() {
        let bus = LocalBus::new();
        bus.add_owned_name("org.example.Svc");
        bus.register_method(&addr(), "Echo", |args| Ok(args.to_vec()));

        let reply = bus.call(&addr(), "Echo", &[json!("hello")]).await.unwrap();
        assert_eq!(reply, vec![json!("hello")]);
    }

    #[tokio::test]
    async fn unknown_service_is_rejected() {
        let bus = LocalBus::new();
        let err = bus.call(&addr(), "Echo", &[]).await.unwrap_err();
        assert!(matches!(err, BusError::ServiceUnknown(_)));
    }

    #[tokio::test]
    async fn activatable_service_starts_on_contact() {
        let bus = LocalBus::new();
        bus.add_activatable_name("org.example.Svc");
        assert!(!bus.owns_name("org.example.Svc").await);

        bus.call(&addr(), "Ping", &[]).await.unwrap();
        assert!(bus.owns_name("org.example.Svc").await);
    }

    #[tokio::test]
    async fn dropped_service_reports_unavailable() {
        let bus = LocalBus::new();
        bus.add_owned_name("org.example.Svc");
        bus.drop_name("org.example.Svc");

        let err = bus.call(&addr(), "Ping", &[]).await.unwrap_err();
        assert!(matches!(err, BusError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn signals_fan_out_to_matching_subscribers() {
        let bus = LocalBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();
        bus.subscribe(
            SignalMatch::new("Changed", "org.example.Svc", "org.example.Svc", None),
            tx,
        );
        bus.subscribe(
            SignalMatch::new(
                "Changed",
                "org.example.Svc",
                "org.example.Svc",
                Some("/other/path".to_string()),
            ),
            other_tx,
        );

        bus.emit(
            "org.example.Svc",
            SignalEvent {
                signal: "Changed".to_string(),
                interface: "org.example.Svc".to_string(),
                path: "/org/example/Svc".to_string(),
                args: vec![json!(7)],
            },
        );

        let event = rx.try_recv().unwrap();
        assert_eq!(event.args, vec![json!(7)]);
        // The path-specific rule does not match the emitted path.
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let bus = LocalBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.subscribe(
            SignalMatch::new("Changed", "org.example.Svc", "org.example.Svc", None),
            tx,
        );
        for n in 0..4 {
            bus.emit(
                "org.example.Svc",
                SignalEvent {
                    signal: "Changed".to_string(),
                    interface: "org.example.Svc".to_string(),
                    path: "/org/example/Svc".to_string(),
                    args: vec![json!(n)],
                },
            );
        }
        for n in 0..4 {
            assert_eq!(rx.try_recv().unwrap().args, vec![json!(n)]);
        }
    }
}
