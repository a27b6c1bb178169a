use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::Scale;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::serde_json;
use k8s_openapi::{Metadata, NamespaceResourceScope, Resource};
use kube::api::{Api, ListParams, LogParams, ObjectMeta, PostParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use log::debug;

use crate::error::Result;
use crate::labels::{selector_string, LabelMap};

pub mod deployments;
pub mod pods;

#[cfg(test)]
pub mod fake;

/// The handful of API verbs the commands are built from. Every method is a
/// single request against the cluster.
pub trait Cluster {
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment>;

    async fn get_scale(&self, namespace: &str, name: &str) -> Result<Scale>;

    async fn replace_scale(&self, namespace: &str, name: &str, scale: &Scale) -> Result<Scale>;

    async fn list_pods(&self, namespace: &str, selector: &LabelMap) -> Result<Vec<Pod>>;

    async fn pod_logs(&self, namespace: &str, pod: &str) -> Result<String>;
}

pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Opens a client from the local kubeconfig, optionally switching to
    /// another context than the current one.
    pub async fn connect(context: Option<String>) -> Result<Self> {
        if context.is_none() {
            debug!("No context specified, will use the current one from the kubeconfig.");
        }
        let config = Config::from_kubeconfig(&KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        })
        .await?;
        debug!("Connecting to the Kubernetes API server at {}.", config.cluster_url);
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    fn api<R: Resource<Scope = NamespaceResourceScope> + Metadata<Ty = ObjectMeta>>(
        &self,
        namespace: &str,
    ) -> Api<R> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

impl Cluster for KubeCluster {
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let deployments = self
            .api::<Deployment>(namespace)
            .list(&ListParams::default())
            .await?;
        debug!(
            "Got {} {}{} from the namespace {namespace}",
            deployments.items.len(),
            Deployment::KIND,
            if deployments.items.len() == 1 { "" } else { "s" },
        );
        Ok(deployments.items)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        Ok(self.api::<Deployment>(namespace).get(name).await?)
    }

    async fn get_scale(&self, namespace: &str, name: &str) -> Result<Scale> {
        Ok(self.api::<Deployment>(namespace).get_scale(name).await?)
    }

    async fn replace_scale(&self, namespace: &str, name: &str, scale: &Scale) -> Result<Scale> {
        let data = serde_json::to_vec(scale)?;
        Ok(self
            .api::<Deployment>(namespace)
            .replace_scale(name, &PostParams::default(), data)
            .await?)
    }

    async fn list_pods(&self, namespace: &str, selector: &LabelMap) -> Result<Vec<Pod>> {
        let selector = selector_string(selector);
        let pods = self
            .api::<Pod>(namespace)
            .list(&ListParams::default().labels(&selector))
            .await?;
        debug!(
            "Got {} {}{} matching {selector} from the namespace {namespace}",
            pods.items.len(),
            Pod::KIND,
            if pods.items.len() == 1 { "" } else { "s" },
        );
        Ok(pods.items)
    }

    async fn pod_logs(&self, namespace: &str, pod: &str) -> Result<String> {
        Ok(self
            .api::<Pod>(namespace)
            .logs(pod, &LogParams::default())
            .await?)
    }
}
