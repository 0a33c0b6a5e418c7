//! kube-rs backed ObjectStore

use crate::error::StoreError;
use crate::store_trait::{label_selector, Labels, ObjectStore};
use crds::{Bundle, BundleDeployment, Channel};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Object store talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn channels(&self) -> Api<Channel> {
        Api::all(self.client.clone())
    }

    fn bundles(&self, namespace: &str) -> Api<Bundle> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn bundle_namespace(bundle: &Bundle) -> Result<String, StoreError> {
        bundle
            .namespace()
            .ok_or_else(|| StoreError::InvalidObject(format!("Bundle {} has no namespace", bundle.name_any())))
    }
}

#[async_trait::async_trait]
impl ObjectStore for KubeStore {
    async fn get_channel(&self, name: &str) -> Result<Option<Channel>, StoreError> {
        Ok(self.channels().get_opt(name).await?)
    }

    async fn update_channel(&self, channel: &Channel) -> Result<Channel, StoreError> {
        let name = channel.name_any();
        let finalizers = channel.metadata.finalizers.clone().unwrap_or_default();
        debug!("Updating finalizers of Channel {}: {:?}", name, finalizers);

        let patch = json!({
            "metadata": {
                "resourceVersion": channel.resource_version(),
                "finalizers": finalizers,
            }
        });
        Ok(self
            .channels()
            .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?)
    }

    async fn update_channel_status(&self, channel: &Channel) -> Result<Channel, StoreError> {
        let name = channel.name_any();
        debug!("Updating status of Channel {}", name);

        let patch = json!({
            "metadata": { "resourceVersion": channel.resource_version() },
            "status": channel.status,
        });
        Ok(self
            .channels()
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?)
    }

    async fn get_bundle(&self, namespace: &str, name: &str) -> Result<Option<Bundle>, StoreError> {
        Ok(self.bundles(namespace).get_opt(name).await?)
    }

    async fn list_bundles(&self, namespace: &str, labels: &Labels) -> Result<Vec<Bundle>, StoreError> {
        let params = ListParams::default().labels(&label_selector(labels));
        Ok(self.bundles(namespace).list(&params).await?.items)
    }

    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle, StoreError> {
        let namespace = Self::bundle_namespace(bundle)?;
        debug!("Creating Bundle {}/{}", namespace, bundle.name_any());
        Ok(self
            .bundles(&namespace)
            .create(&PostParams::default(), bundle)
            .await?)
    }

    async fn update_bundle(&self, bundle: &Bundle) -> Result<Bundle, StoreError> {
        let namespace = Self::bundle_namespace(bundle)?;
        let name = bundle.name_any();
        debug!("Replacing Bundle {}/{}", namespace, name);
        Ok(self
            .bundles(&namespace)
            .replace(&name, &PostParams::default(), bundle)
            .await?)
    }

    async fn delete_bundle(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        debug!("Deleting Bundle {}/{}", namespace, name);
        match self.bundles(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_bundle_deployments(&self, labels: &Labels) -> Result<Vec<BundleDeployment>, StoreError> {
        let params = ListParams::default().labels(&label_selector(labels));
        let api: Api<BundleDeployment> = Api::all(self.client.clone());
        Ok(api.list(&params).await?.items)
    }
}
