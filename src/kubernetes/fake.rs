//! In-memory cluster used by the command tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec, ScaleStatus};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, Time};
use kube::api::ObjectMeta;
use kube::core::ErrorResponse;
use kube::ResourceExt;

use super::Cluster;
use crate::error::Result;
use crate::labels::{is_subset, LabelMap};

pub fn labels(pairs: &[(&str, &str)]) -> LabelMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn deployment(namespace: &str, name: &str, labels: LabelMap, replicas: i32) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            labels: Some(labels),
            resource_version: Some("1".to_owned()),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(BTreeMap::from([("app".to_owned(), name.to_owned())])),
                match_expressions: None,
            },
            ..DeploymentSpec::default()
        }),
        status: None,
    }
}

pub fn pod(namespace: &str, name: &str, app: &str, created: Option<DateTime<Utc>>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            labels: Some(BTreeMap::from([("app".to_owned(), app.to_owned())])),
            creation_timestamp: created.map(Time),
            ..ObjectMeta::default()
        },
        ..Pod::default()
    }
}

fn not_found(kind: &str, name: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: format!("{kind} \"{name}\" not found"),
        reason: "NotFound".to_owned(),
        code: 404,
    })
}

#[derive(Default)]
pub struct FakeCluster {
    deployments: RefCell<Vec<Deployment>>,
    pods: Vec<Pod>,
    logs: BTreeMap<String, String>,
    /// Every replica count written, in order, as `(name, replicas)`.
    pub writes: RefCell<Vec<(String, i32)>>,
}

impl FakeCluster {
    pub fn with_deployments(deployments: Vec<Deployment>) -> Self {
        Self {
            deployments: RefCell::new(deployments),
            ..Self::default()
        }
    }

    pub fn with_pod(mut self, pod: Pod, logs: &str) -> Self {
        self.logs.insert(pod.name_any(), logs.to_owned());
        self.pods.push(pod);
        self
    }

    fn find(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.deployments
            .borrow()
            .iter()
            .find(|d| d.namespace().as_deref() == Some(namespace) && d.name_any() == name)
            .cloned()
            .ok_or_else(|| not_found("deployments.apps", name).into())
    }
}

impl Cluster for FakeCluster {
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>> {
        Ok(self
            .deployments
            .borrow()
            .iter()
            .filter(|d| d.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.find(namespace, name)
    }

    async fn get_scale(&self, namespace: &str, name: &str) -> Result<Scale> {
        let deployment = self.find(namespace, name)?;
        let replicas = deployment.spec.and_then(|spec| spec.replicas);
        Ok(Scale {
            metadata: deployment.metadata,
            spec: Some(ScaleSpec { replicas }),
            status: Some(ScaleStatus {
                replicas: replicas.unwrap_or_default(),
                selector: None,
            }),
        })
    }

    async fn replace_scale(&self, namespace: &str, name: &str, scale: &Scale) -> Result<Scale> {
        let replicas = scale.spec.as_ref().and_then(|spec| spec.replicas);
        let mut deployments = self.deployments.borrow_mut();
        let deployment = deployments
            .iter_mut()
            .find(|d| d.namespace().as_deref() == Some(namespace) && d.name_any() == name)
            .ok_or_else(|| not_found("deployments.apps", name))?;
        if let Some(spec) = deployment.spec.as_mut() {
            spec.replicas = replicas;
        }
        self.writes
            .borrow_mut()
            .push((name.to_owned(), replicas.unwrap_or_default()));
        Ok(scale.clone())
    }

    async fn list_pods(&self, namespace: &str, selector: &LabelMap) -> Result<Vec<Pod>> {
        Ok(self
            .pods
            .iter()
            .filter(|p| p.namespace().as_deref() == Some(namespace))
            .filter(|p| is_subset(selector, p.labels()))
            .cloned()
            .collect())
    }

    async fn pod_logs(&self, _namespace: &str, pod: &str) -> Result<String> {
        self.logs
            .get(pod)
            .cloned()
            .ok_or_else(|| not_found("pods", pod).into())
    }
}
