use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use log::debug;

use super::Cluster;
use crate::error::{Error, Result};
use crate::labels::selector_to_map;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d|%H:%M:%S UTC";

/// Lists the pods selected by a deployment's label selector.
pub async fn pods_for_deployment<C: Cluster>(
    cluster: &C,
    name: &str,
    namespace: &str,
) -> Result<Vec<Pod>> {
    let deployment = cluster.get_deployment(namespace, name).await?;
    let selector = deployment
        .spec
        .as_ref()
        .map(|spec| &spec.selector)
        .ok_or_else(|| Error::UnsupportedSelector(name.to_owned()))?;
    let selector = selector_to_map(name, selector)?;
    cluster.list_pods(namespace, &selector).await
}

fn created_at(pod: &Pod) -> Option<DateTime<Utc>> {
    let created = pod.creation_timestamp().map(|time| time.0);
    if created.is_none() {
        debug!("Pod {} has no creation timestamp, skipping it.", pod.name_any());
    }
    created
}

pub fn creation_timestamps(pods: &[Pod]) -> BTreeMap<String, String> {
    pods.iter()
        .filter_map(|pod| Some((pod.name_any(), created_at(pod)?)))
        .map(|(name, created)| (name, created.format(TIMESTAMP_FORMAT).to_string()))
        .collect()
}

/// Time each pod has been alive at `now`.
pub fn lifetimes(pods: &[Pod], now: DateTime<Utc>) -> BTreeMap<String, String> {
    pods.iter()
        .filter_map(|pod| Some((pod.name_any(), created_at(pod)?)))
        .map(|(name, created)| (name, format_lifetime(now.signed_duration_since(created))))
        .collect()
}

/// Renders a duration as `1h2m3s`, leaving out leading zero units.
pub fn format_lifetime(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

pub async fn pod_logs<C: Cluster>(
    cluster: &C,
    pods: &[Pod],
    namespace: &str,
) -> Result<BTreeMap<String, String>> {
    let mut logs = BTreeMap::new();
    for pod in pods {
        let name = pod.name_any();
        let text = cluster.pod_logs(namespace, &name).await?;
        debug!("Fetched {} bytes of logs from pod {name}.", text.len());
        logs.insert(name, text);
    }
    Ok(logs)
}
