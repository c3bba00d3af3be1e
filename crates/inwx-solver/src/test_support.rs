//! In-memory registrar and secret store fakes for unit tests.

use async_trait::async_trait;
use inwx_core::{
    NameserverRecord, RecordQuery, RecordRequest, Registrar, RegistrarConnector, RegistrarError,
    RegistrarResult, SecretData, SecretStore, SecretStoreError,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::secrets::InMemorySecretStore;

/// A registrar call as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect { sandbox: bool },
    Login(String),
    Unlock(String),
    Logout,
    Create(RecordRequest),
    Query(RecordQuery),
    Delete(u64),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<(Call, Instant)>,
    records: Vec<NameserverRecord>,
    next_id: u64,
    reject_login: bool,
    unlock_rejections: u32,
    fail_logout: bool,
    fail_create: Option<RegistrarError>,
    fail_query: Option<RegistrarError>,
    failing_deletes: HashSet<u64>,
}

/// Connector handing out clients that share one fake registrar account.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn reject_login(&self) {
        self.with_state(|s| s.reject_login = true);
    }

    pub fn reject_unlocks(&self, times: u32) {
        self.with_state(|s| s.unlock_rejections = times);
    }

    pub fn fail_logout(&self) {
        self.with_state(|s| s.fail_logout = true);
    }

    pub fn fail_create(&self, err: RegistrarError) {
        self.with_state(|s| s.fail_create = Some(err));
    }

    pub fn fail_query(&self, err: RegistrarError) {
        self.with_state(|s| s.fail_query = Some(err));
    }

    pub fn fail_delete(&self, id: u64) {
        self.with_state(|s| {
            s.failing_deletes.insert(id);
        });
    }

    /// Add an existing TXT record and return its id.
    pub fn seed_record(&self, name: &str, content: &str) -> u64 {
        self.with_state(|s| insert_record(s, name, "TXT", content, 300))
    }

    pub fn records(&self) -> Vec<NameserverRecord> {
        self.with_state(|s| s.records.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.iter().map(|(c, _)| c.clone()).collect())
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.with_state(|s| s.calls.iter().filter(|(c, _)| pred(c)).count())
    }

    /// Instants of the calls matching `pred`, in order.
    pub fn timed_calls(&self, pred: impl Fn(&Call) -> bool) -> Vec<Instant> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter(|(c, _)| pred(c))
                .map(|(_, at)| *at)
                .collect()
        })
    }

    /// Let tasks spawned by dropped sessions run to completion.
    pub async fn settle(&self) {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    pub fn unlock_codes(&self) -> Vec<String> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|(c, _)| match c {
                    Call::Unlock(code) => Some(code.clone()),
                    _ => None,
                })
                .collect()
        })
    }
}

fn insert_record(
    state: &mut FakeState,
    name: &str,
    record_type: &str,
    content: &str,
    ttl: u32,
) -> u64 {
    state.next_id += 1;
    state.records.push(NameserverRecord {
        id: state.next_id,
        name: name.to_string(),
        record_type: record_type.to_string(),
        content: content.to_string(),
        ttl,
    });
    state.next_id
}

impl RegistrarConnector for FakeRegistry {
    fn connect(&self, sandbox: bool) -> Arc<dyn Registrar> {
        self.with_state(|s| s.calls.push((Call::Connect { sandbox }, Instant::now())));
        Arc::new(FakeClient {
            registry: self.clone(),
        })
    }
}

struct FakeClient {
    registry: FakeRegistry,
}

impl FakeClient {
    fn record<R>(&self, call: Call, f: impl FnOnce(&mut FakeState) -> R) -> R {
        self.registry.with_state(|s| {
            s.calls.push((call, Instant::now()));
            f(s)
        })
    }
}

#[async_trait]
impl Registrar for FakeClient {
    async fn login(&self, username: &str, _password: &str) -> RegistrarResult<()> {
        self.record(Call::Login(username.to_string()), |s| {
            if s.reject_login {
                Err(RegistrarError::from_response(2200, "Authentication error"))
            } else {
                Ok(())
            }
        })
    }

    async fn unlock(&self, code: &str) -> RegistrarResult<()> {
        self.record(Call::Unlock(code.to_string()), |s| {
            if s.unlock_rejections > 0 {
                s.unlock_rejections -= 1;
                Err(RegistrarError::from_response(2200, "Invalid TAN"))
            } else {
                Ok(())
            }
        })
    }

    async fn logout(&self) -> RegistrarResult<()> {
        self.record(Call::Logout, |s| {
            if s.fail_logout {
                Err(RegistrarError::Transport("connection closed".into()))
            } else {
                Ok(())
            }
        })
    }

    async fn create_record(&self, request: &RecordRequest) -> RegistrarResult<()> {
        self.record(Call::Create(request.clone()), |s| {
            if let Some(err) = s.fail_create.clone() {
                return Err(err);
            }
            let exists = s.records.iter().any(|r| {
                r.name == request.name
                    && r.record_type == request.record_type
                    && r.content == request.content
            });
            if exists {
                return Err(RegistrarError::from_response(2302, "Object exists"));
            }
            insert_record(s, &request.name, &request.record_type, &request.content, request.ttl);
            Ok(())
        })
    }

    async fn query_records(&self, query: &RecordQuery) -> RegistrarResult<Vec<NameserverRecord>> {
        self.record(Call::Query(query.clone()), |s| {
            if let Some(err) = s.fail_query.clone() {
                return Err(err);
            }
            Ok(s.records
                .iter()
                .filter(|r| r.name == query.name && r.record_type == query.record_type)
                .cloned()
                .collect())
        })
    }

    async fn delete_record(&self, id: u64) -> RegistrarResult<()> {
        self.record(Call::Delete(id), |s| {
            if s.failing_deletes.contains(&id) {
                return Err(RegistrarError::Rejected {
                    code: 2400,
                    message: format!("cannot delete record {id}"),
                });
            }
            s.records.retain(|r| r.id != id);
            Ok(())
        })
    }
}

/// Secret store that records every lookup it serves.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemorySecretStore,
    lookups: Mutex<Vec<(String, String)>>,
}

impl CountingStore {
    pub fn with_secret(namespace: &str, name: &str, entries: &[(&str, &str)]) -> Self {
        let store = Self::default();
        store.inner.insert_strings(namespace, name, entries.iter().copied());
        store
    }

    pub fn with_raw_secret(namespace: &str, name: &str, data: SecretData) -> Self {
        let store = Self::default();
        store.inner.insert(namespace, name, data);
        store
    }

    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError> {
        self.lookups
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        self.inner.get(namespace, name).await
    }
}
