//! Mock ObjectStore for unit testing
//!
//! Keeps Channels, Bundles and BundleDeployments in memory and mimics the
//! API server behaviour the reconcilers depend on:
//!
//! - every write bumps a `resourceVersion`; writes carrying a stale one
//!   fail with `Conflict`
//! - a Channel whose deletion was requested disappears once its last
//!   finalizer is removed
//! - failures can be injected per operation family
//!
//! Every write is recorded as a [`StoreOp`] so tests can assert on ordering.

use crate::error::StoreError;
use crate::store_trait::{Labels, ObjectStore};
use crds::{Bundle, BundleDeployment, Channel};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Deletion timestamp stamped on Channels by [`MockObjectStore::request_channel_deletion`]
const DELETION_TIMESTAMP: &str = "2026-01-01T00:00:00Z";

/// A write performed against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    UpdateChannel(String),
    UpdateChannelStatus(String),
    /// `<namespace>/<name>`
    CreateBundle(String),
    UpdateBundle(String),
    DeleteBundle(String),
}

#[derive(Default)]
struct State {
    channels: BTreeMap<String, Channel>,
    bundles: BTreeMap<(String, String), Bundle>,
    bundle_deployments: Vec<BundleDeployment>,
    next_version: u64,
    ops: Vec<StoreOp>,
    list_deployments_error: Option<String>,
    bundle_write_error: Option<String>,
    pending_bundle_conflicts: usize,
}

impl State {
    fn bump(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

/// In-memory ObjectStore
#[derive(Clone, Default)]
pub struct MockObjectStore {
    state: Arc<Mutex<State>>,
}

fn matches_labels(object_labels: &BTreeMap<String, String>, wanted: &Labels) -> bool {
    wanted.iter().all(|(k, v)| object_labels.get(k) == Some(v))
}

fn bundle_key(bundle: &Bundle) -> Result<(String, String), StoreError> {
    let namespace = bundle
        .namespace()
        .ok_or_else(|| StoreError::InvalidObject(format!("Bundle {} has no namespace", bundle.name_any())))?;
    Ok((namespace, bundle.name_any()))
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a Channel, assigning a uid and resourceVersion
    pub fn add_channel(&self, mut channel: Channel) -> Channel {
        let mut state = self.state.lock().unwrap();
        let version = state.bump();
        let name = channel.name_any();
        if channel.metadata.uid.is_none() {
            channel.metadata.uid = Some(format!("uid-{}", name));
        }
        channel.metadata.resource_version = Some(version);
        state.channels.insert(name, channel.clone());
        channel
    }

    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.state.lock().unwrap().channels.get(name).cloned()
    }

    /// Replaces a Channel's spec as a user edit would
    pub fn edit_channel(&self, name: &str, edit: impl FnOnce(&mut Channel)) {
        let mut state = self.state.lock().unwrap();
        let version = state.bump();
        if let Some(channel) = state.channels.get_mut(name) {
            edit(channel);
            channel.metadata.resource_version = Some(version);
        }
    }

    /// Marks a Channel for deletion; removes it at once if it has no finalizers
    pub fn request_channel_deletion(&self, name: &str) -> Result<(), StoreError> {
        let timestamp: Time = serde_json::from_value(serde_json::json!(DELETION_TIMESTAMP))?;
        let mut state = self.state.lock().unwrap();
        let version = state.bump();
        let Some(channel) = state.channels.get_mut(name) else {
            return Err(StoreError::NotFound(format!("Channel {}", name)));
        };
        if channel.finalizers().is_empty() {
            state.channels.remove(name);
            return Ok(());
        }
        channel.metadata.deletion_timestamp = Some(timestamp);
        channel.metadata.resource_version = Some(version);
        Ok(())
    }

    /// Seeds a Bundle as if it had been created earlier
    pub fn add_bundle(&self, mut bundle: Bundle) -> Result<Bundle, StoreError> {
        let key = bundle_key(&bundle)?;
        let mut state = self.state.lock().unwrap();
        bundle.metadata.resource_version = Some(state.bump());
        state.bundles.insert(key, bundle.clone());
        Ok(bundle)
    }

    pub fn bundle(&self, namespace: &str, name: &str) -> Option<Bundle> {
        self.state
            .lock()
            .unwrap()
            .bundles
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn bundles(&self) -> Vec<Bundle> {
        self.state.lock().unwrap().bundles.values().cloned().collect()
    }

    pub fn add_bundle_deployment(&self, deployment: BundleDeployment) {
        self.state.lock().unwrap().bundle_deployments.push(deployment);
    }

    pub fn clear_bundle_deployments(&self) {
        self.state.lock().unwrap().bundle_deployments.clear();
    }

    /// Makes every BundleDeployment list fail with the given message
    pub fn fail_list_bundle_deployments(&self, message: impl Into<String>) {
        self.state.lock().unwrap().list_deployments_error = Some(message.into());
    }

    /// Makes every Bundle create/update/delete fail with the given message
    pub fn fail_bundle_writes(&self, message: impl Into<String>) {
        self.state.lock().unwrap().bundle_write_error = Some(message.into());
    }

    /// Makes the next `count` Bundle creates/updates fail with `Conflict`
    pub fn conflict_bundle_writes(&self, count: usize) {
        self.state.lock().unwrap().pending_bundle_conflicts = count;
    }

    /// Clears all injected failures
    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.list_deployments_error = None;
        state.bundle_write_error = None;
        state.pending_bundle_conflicts = 0;
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    /// Number of status writes recorded since the last [`clear_ops`](Self::clear_ops)
    pub fn status_writes(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, StoreOp::UpdateChannelStatus(_)))
            .count()
    }

    /// Number of Bundle creates and updates recorded since the last [`clear_ops`](Self::clear_ops)
    pub fn bundle_writes(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, StoreOp::CreateBundle(_) | StoreOp::UpdateBundle(_)))
            .count()
    }
}

fn check_bundle_write(state: &mut State) -> Result<(), StoreError> {
    if let Some(message) = &state.bundle_write_error {
        return Err(StoreError::Backend(message.clone()));
    }
    if state.pending_bundle_conflicts > 0 {
        state.pending_bundle_conflicts -= 1;
        return Err(StoreError::Conflict("injected bundle conflict".to_string()));
    }
    Ok(())
}

fn check_version(stored: Option<&String>, given: Option<&String>, what: &str) -> Result<(), StoreError> {
    match given {
        Some(given) if stored != Some(given) => Err(StoreError::Conflict(format!(
            "{} has been modified; resourceVersion {} is stale",
            what, given
        ))),
        _ => Ok(()),
    }
}

#[async_trait::async_trait]
impl ObjectStore for MockObjectStore {
    async fn get_channel(&self, name: &str) -> Result<Option<Channel>, StoreError> {
        Ok(self.channel(name))
    }

    async fn update_channel(&self, channel: &Channel) -> Result<Channel, StoreError> {
        let name = channel.name_any();
        let mut state = self.state.lock().unwrap();
        let version = state.bump();
        let what = format!("Channel {}", name);

        let stored = state
            .channels
            .get_mut(&name)
            .ok_or_else(|| StoreError::NotFound(what.clone()))?;
        check_version(
            stored.metadata.resource_version.as_ref(),
            channel.metadata.resource_version.as_ref(),
            &what,
        )?;

        stored.metadata.finalizers = channel.metadata.finalizers.clone();
        stored.metadata.resource_version = Some(version);
        let updated = stored.clone();

        state.ops.push(StoreOp::UpdateChannel(name.clone()));
        if updated.metadata.deletion_timestamp.is_some() && updated.finalizers().is_empty() {
            state.channels.remove(&name);
        }
        Ok(updated)
    }

    async fn update_channel_status(&self, channel: &Channel) -> Result<Channel, StoreError> {
        let name = channel.name_any();
        let mut state = self.state.lock().unwrap();
        let version = state.bump();
        let what = format!("Channel {}", name);

        let stored = state
            .channels
            .get_mut(&name)
            .ok_or_else(|| StoreError::NotFound(what.clone()))?;
        check_version(
            stored.metadata.resource_version.as_ref(),
            channel.metadata.resource_version.as_ref(),
            &what,
        )?;

        stored.status = channel.status.clone();
        stored.metadata.resource_version = Some(version);
        let updated = stored.clone();
        state.ops.push(StoreOp::UpdateChannelStatus(name));
        Ok(updated)
    }

    async fn get_bundle(&self, namespace: &str, name: &str) -> Result<Option<Bundle>, StoreError> {
        Ok(self.bundle(namespace, name))
    }

    async fn list_bundles(&self, namespace: &str, labels: &Labels) -> Result<Vec<Bundle>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bundles
            .iter()
            .filter(|((ns, _), b)| ns == namespace && matches_labels(b.labels(), labels))
            .map(|(_, b)| b.clone())
            .collect())
    }

    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle, StoreError> {
        let key = bundle_key(bundle)?;
        let mut state = self.state.lock().unwrap();
        check_bundle_write(&mut state)?;
        if state.bundles.contains_key(&key) {
            return Err(StoreError::Conflict(format!("Bundle {}/{} already exists", key.0, key.1)));
        }

        let mut created = bundle.clone();
        created.metadata.resource_version = Some(state.bump());
        state.ops.push(StoreOp::CreateBundle(format!("{}/{}", key.0, key.1)));
        state.bundles.insert(key, created.clone());
        Ok(created)
    }

    async fn update_bundle(&self, bundle: &Bundle) -> Result<Bundle, StoreError> {
        let key = bundle_key(bundle)?;
        let mut state = self.state.lock().unwrap();
        check_bundle_write(&mut state)?;
        let version = state.bump();
        let what = format!("Bundle {}/{}", key.0, key.1);

        let stored = state
            .bundles
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(what.clone()))?;
        check_version(
            stored.metadata.resource_version.as_ref(),
            bundle.metadata.resource_version.as_ref(),
            &what,
        )?;

        *stored = bundle.clone();
        stored.metadata.resource_version = Some(version);
        let updated = stored.clone();
        state.ops.push(StoreOp::UpdateBundle(format!("{}/{}", key.0, key.1)));
        Ok(updated)
    }

    async fn delete_bundle(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.bundle_write_error {
            return Err(StoreError::Backend(message.clone()));
        }
        state.bundles.remove(&(namespace.to_string(), name.to_string()));
        state.ops.push(StoreOp::DeleteBundle(format!("{}/{}", namespace, name)));
        Ok(())
    }

    async fn list_bundle_deployments(&self, labels: &Labels) -> Result<Vec<BundleDeployment>, StoreError> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.list_deployments_error {
            return Err(StoreError::Backend(message.clone()));
        }
        Ok(state
            .bundle_deployments
            .iter()
            .filter(|bd| matches_labels(bd.labels(), labels))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{BundleSpec, ChannelSpec, ClusterSelector};

    fn channel(name: &str) -> Channel {
        Channel::new(
            name,
            ChannelSpec {
                vendor: "nvidia".to_string(),
                channel: "stable".to_string(),
                cluster_selector: ClusterSelector::default(),
            },
        )
    }

    fn bundle(name: &str, owner: &str) -> Bundle {
        let mut b = Bundle::new(name, BundleSpec::default());
        b.metadata.namespace = Some("cattle-fleet-system".to_string());
        b.labels_mut().insert("multi.suse.io/owner".to_string(), owner.to_string());
        b
    }

    #[tokio::test]
    async fn test_stale_channel_write_conflicts() {
        let store = MockObjectStore::new();
        let seeded = store.add_channel(channel("ch"));

        let mut first = seeded.clone();
        first.add_finalizer("x/y");
        store.update_channel(&first).await.unwrap();

        // Second writer still holds the old resourceVersion
        let mut stale = seeded;
        stale.status = Some(Default::default());
        let err = store.update_channel_status(&stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_deleting_channel_disappears_when_finalizers_removed() {
        let store = MockObjectStore::new();
        let mut ch = channel("ch");
        ch.add_finalizer("x/y");
        store.add_channel(ch);

        store.request_channel_deletion("ch").unwrap();
        let mut deleting = store.channel("ch").unwrap();
        assert!(deleting.is_deleting());

        deleting.remove_finalizer("x/y");
        store.update_channel(&deleting).await.unwrap();
        assert!(store.channel("ch").is_none());
    }

    #[tokio::test]
    async fn test_channel_without_finalizers_is_removed_immediately() {
        let store = MockObjectStore::new();
        store.add_channel(channel("ch"));
        store.request_channel_deletion("ch").unwrap();
        assert!(store.get_channel("ch").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bundle_lifecycle_and_label_filtering() {
        let store = MockObjectStore::new();
        let created = store.create_bundle(&bundle("a", "ch-1")).await.unwrap();
        store.create_bundle(&bundle("b", "ch-2")).await.unwrap();

        let err = store.create_bundle(&bundle("a", "ch-1")).await.unwrap_err();
        assert!(err.is_conflict());

        let mut labels = Labels::new();
        labels.insert("multi.suse.io/owner".to_string(), "ch-1".to_string());
        let owned = store.list_bundles("cattle-fleet-system", &labels).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].name_any(), "a");

        store.update_bundle(&created).await.unwrap();
        // Reusing the pre-update copy is now stale
        assert!(store.update_bundle(&created).await.unwrap_err().is_conflict());

        store.delete_bundle("cattle-fleet-system", "a").await.unwrap();
        store.delete_bundle("cattle-fleet-system", "a").await.unwrap();
        assert!(store.bundle("cattle-fleet-system", "a").is_none());
        assert_eq!(store.bundles().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MockObjectStore::new();
        store.fail_list_bundle_deployments("boom");
        assert!(store.list_bundle_deployments(&Labels::new()).await.is_err());

        store.conflict_bundle_writes(1);
        assert!(store.create_bundle(&bundle("a", "ch")).await.unwrap_err().is_conflict());
        store.create_bundle(&bundle("a", "ch")).await.unwrap();

        store.fail_bundle_writes("denied");
        assert!(matches!(
            store.delete_bundle("cattle-fleet-system", "a").await.unwrap_err(),
            StoreError::Backend(_)
        ));

        store.heal();
        assert!(store.list_bundle_deployments(&Labels::new()).await.unwrap().is_empty());
        assert_eq!(store.bundle_writes(), 1);
    }
}
