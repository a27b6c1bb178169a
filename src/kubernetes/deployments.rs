use std::collections::BTreeMap;

use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec};
use kube::ResourceExt;
use log::{debug, info};

use super::Cluster;
use crate::error::{Error, Result};
use crate::labels::{is_subset, LabelMap, Target};

pub async fn count_with_labels<C: Cluster>(
    cluster: &C,
    labels: &LabelMap,
    namespace: &str,
) -> Result<usize> {
    Ok(cluster
        .list_deployments(namespace)
        .await?
        .iter()
        .filter(|deployment| is_subset(labels, deployment.labels()))
        .count())
}

/// Names of every deployment in `namespace` carrying all of `labels`. Finding
/// none is an error.
pub async fn names_with_labels<C: Cluster>(
    cluster: &C,
    labels: &LabelMap,
    namespace: &str,
) -> Result<Vec<String>> {
    let names: Vec<String> = cluster
        .list_deployments(namespace)
        .await?
        .into_iter()
        .filter(|deployment| is_subset(labels, deployment.labels()))
        .map(|deployment| deployment.name_any())
        .inspect(|name| debug!("Deployment {name} in namespace {namespace} matches the labels."))
        .collect();
    if names.is_empty() {
        return Err(Error::NoMatch {
            namespace: namespace.to_owned(),
            target: Target::Labels(labels.clone()).to_string(),
        });
    }
    Ok(names)
}

pub async fn resolve_names<C: Cluster>(
    cluster: &C,
    target: &Target,
    namespace: &str,
) -> Result<Vec<String>> {
    match target {
        Target::Names(names) => Ok(names.clone()),
        Target::Labels(labels) => names_with_labels(cluster, labels, namespace).await,
    }
}

/// Resolves a target that must designate exactly one deployment.
pub async fn resolve_single<C: Cluster>(
    cluster: &C,
    target: &Target,
    namespace: &str,
) -> Result<String> {
    let mut names = resolve_names(cluster, target, namespace).await?;
    match names.len() {
        1 => Ok(names.remove(0)),
        0 => Err(Error::NoMatch {
            namespace: namespace.to_owned(),
            target: target.to_string(),
        }),
        count => Err(Error::Ambiguous {
            namespace: namespace.to_owned(),
            target: target.to_string(),
            count,
        }),
    }
}

fn replicas_of(scale: &Scale) -> i32 {
    scale
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or_default()
}

pub async fn get_scale<C: Cluster>(cluster: &C, name: &str, namespace: &str) -> Result<i32> {
    let scale = cluster.get_scale(namespace, name).await?;
    Ok(replicas_of(&scale))
}

pub async fn get_scales<C: Cluster>(
    cluster: &C,
    names: &[String],
    namespace: &str,
) -> Result<BTreeMap<String, i32>> {
    let mut scales = BTreeMap::new();
    for name in names {
        scales.insert(name.clone(), get_scale(cluster, name, namespace).await?);
    }
    Ok(scales)
}

/// Rewrites the replica count of a deployment through its scale subresource.
/// The scale read first carries the resource version the update is checked
/// against.
pub async fn set_scale<C: Cluster>(
    cluster: &C,
    name: &str,
    replicas: i32,
    namespace: &str,
) -> Result<Scale> {
    let mut scale = cluster.get_scale(namespace, name).await?;
    let previous = replicas_of(&scale);
    scale.spec = Some(ScaleSpec {
        replicas: Some(replicas),
    });
    let scale = cluster.replace_scale(namespace, name, &scale).await?;
    info!("Scaled deployment {name} in namespace {namespace} from {previous} to {replicas}.");
    Ok(scale)
}

pub async fn set_scales<C: Cluster>(
    cluster: &C,
    names: &[String],
    replicas: i32,
    namespace: &str,
) -> Result<Vec<Scale>> {
    let mut scales = Vec::with_capacity(names.len());
    for name in names {
        scales.push(set_scale(cluster, name, replicas, namespace).await?);
    }
    Ok(scales)
}
