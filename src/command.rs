use std::fmt;

use chrono::Utc;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::kubernetes::{deployments, pods, Cluster};
use crate::labels::{
    parse_target, split_labels, validate_labels, validate_name, validate_namespace, LabelMap,
    Target,
};
use crate::output::Output;

const ON_REPLICAS: i32 = 1;
const OFF_REPLICAS: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    GetNumWithLabels,
    GetName,
    GetNames,
    GetScale,
    GetScales,
    SetScale,
    SetScales,
    ToggleOn,
    ToggleOff,
    Reset,
    GetPodTimestamps,
    GetPodLifetimes,
    GetPodLogs,
}

impl CommandKind {
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::GetNumWithLabels => "getNumWithLabels",
            CommandKind::GetName => "getName",
            CommandKind::GetNames => "getNames",
            CommandKind::GetScale => "getScale",
            CommandKind::GetScales => "getScales",
            CommandKind::SetScale => "setScale",
            CommandKind::SetScales => "setScales",
            CommandKind::ToggleOn => "toggleOn",
            CommandKind::ToggleOff => "toggleOff",
            CommandKind::Reset => "reset",
            CommandKind::GetPodTimestamps => "getPodTimestamps",
            CommandKind::GetPodLifetimes => "getPodLifetimes",
            CommandKind::GetPodLogs => "getPodLogs",
        }
    }

    fn takes_scale(self) -> bool {
        matches!(self, CommandKind::SetScale | CommandKind::SetScales)
    }

    /// Commands that select deployments by labels only and never by name.
    fn labels_only(self) -> bool {
        matches!(
            self,
            CommandKind::GetNumWithLabels | CommandKind::GetName | CommandKind::GetNames
        )
    }

    fn usage(self) -> String {
        let target = if self.labels_only() {
            "<label=value>..."
        } else {
            "<label=value>...|<name>..."
        };
        let scale = if self.takes_scale() { " <scale>" } else { "" };
        format!("{} {target}{scale} <namespace>", self.name())
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One invocation: what to do, to which deployments, in which namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeCommand {
    pub kind: CommandKind,
    pub target: Target,
    pub scale: Option<i32>,
    pub namespace: String,
}

fn parse_scale(value: &str) -> Result<i32> {
    value
        .parse::<i32>()
        .ok()
        .filter(|scale| *scale >= 0)
        .ok_or_else(|| Error::InvalidScale(value.to_owned()))
}

impl KubeCommand {
    /// Reads the positional arguments following the command name: the target
    /// run, the scale for the setters, and the namespace last.
    pub fn parse<S: AsRef<str>>(kind: CommandKind, args: &[S]) -> Result<Self> {
        let required = if kind.takes_scale() { 3 } else { 2 };
        if args.len() < required {
            return Err(Error::InvalidArguments(format!(
                "expected `{}`, got {} argument{}",
                kind.usage(),
                args.len(),
                if args.len() == 1 { "" } else { "s" }
            )));
        }
        let (namespace, rest) = args
            .split_last()
            .ok_or_else(|| Error::InvalidArguments(kind.usage()))?;
        let namespace = namespace.as_ref().to_owned();
        validate_namespace(&namespace)?;

        let (scale, targets) = match rest.split_last() {
            Some((scale, targets)) if kind.takes_scale() => {
                (Some(parse_scale(scale.as_ref())?), targets)
            }
            _ => (None, rest),
        };

        let target = if kind.labels_only() {
            Target::Labels(split_labels(targets)?)
        } else {
            parse_target(targets)?
        };
        match &target {
            Target::Labels(labels) => validate_labels(labels)?,
            Target::Names(names) => names.iter().try_for_each(|name| validate_name(name))?,
        }

        Ok(Self {
            kind,
            target,
            scale,
            namespace,
        })
    }

    fn labels(&self) -> Result<&LabelMap> {
        match &self.target {
            Target::Labels(labels) => Ok(labels),
            Target::Names(_) => Err(Error::InvalidArguments(format!(
                "{} only accepts labels",
                self.kind
            ))),
        }
    }

    fn replicas(&self) -> Result<i32> {
        self.scale.ok_or_else(|| {
            Error::InvalidArguments(format!("{} requires a scale", self.kind))
        })
    }
}

pub async fn execute<C: Cluster>(command: &KubeCommand, cluster: &C) -> Result<Output> {
    let namespace = command.namespace.as_str();
    let target = &command.target;
    debug!("Running {} on {target} in namespace {namespace}.", command.kind);

    let output = match command.kind {
        CommandKind::GetNumWithLabels => Output::Count(
            deployments::count_with_labels(cluster, command.labels()?, namespace).await?,
        ),
        CommandKind::GetName => {
            Output::Value(deployments::resolve_single(cluster, target, namespace).await?)
        }
        CommandKind::GetNames => Output::Lines(
            deployments::names_with_labels(cluster, command.labels()?, namespace).await?,
        ),
        CommandKind::GetScale => {
            let name = deployments::resolve_single(cluster, target, namespace).await?;
            let replicas = deployments::get_scale(cluster, &name, namespace).await?;
            Output::Value(replicas.to_string())
        }
        CommandKind::GetScales => {
            let names = deployments::resolve_names(cluster, target, namespace).await?;
            let scales = deployments::get_scales(cluster, &names, namespace).await?;
            Output::Map(
                scales
                    .into_iter()
                    .map(|(name, replicas)| (name, replicas.to_string()))
                    .collect(),
            )
        }
        CommandKind::SetScale => {
            let name = deployments::resolve_single(cluster, target, namespace).await?;
            deployments::set_scale(cluster, &name, command.replicas()?, namespace).await?;
            Output::Empty
        }
        CommandKind::SetScales => {
            let names = deployments::resolve_names(cluster, target, namespace).await?;
            deployments::set_scales(cluster, &names, command.replicas()?, namespace).await?;
            Output::Empty
        }
        CommandKind::ToggleOn => {
            let names = deployments::resolve_names(cluster, target, namespace).await?;
            deployments::set_scales(cluster, &names, ON_REPLICAS, namespace).await?;
            Output::Empty
        }
        CommandKind::ToggleOff => {
            let names = deployments::resolve_names(cluster, target, namespace).await?;
            deployments::set_scales(cluster, &names, OFF_REPLICAS, namespace).await?;
            Output::Empty
        }
        CommandKind::Reset => {
            let names = deployments::resolve_names(cluster, target, namespace).await?;
            deployments::set_scales(cluster, &names, OFF_REPLICAS, namespace).await?;
            deployments::set_scales(cluster, &names, ON_REPLICAS, namespace).await?;
            info!("Reset {} deployment(s) in namespace {namespace}.", names.len());
            Output::Empty
        }
        CommandKind::GetPodTimestamps => {
            let name = deployments::resolve_single(cluster, target, namespace).await?;
            let pods = pods::pods_for_deployment(cluster, &name, namespace).await?;
            Output::Map(pods::creation_timestamps(&pods))
        }
        CommandKind::GetPodLifetimes => {
            let name = deployments::resolve_single(cluster, target, namespace).await?;
            let pods = pods::pods_for_deployment(cluster, &name, namespace).await?;
            Output::Map(pods::lifetimes(&pods, Utc::now()))
        }
        CommandKind::GetPodLogs => {
            let name = deployments::resolve_single(cluster, target, namespace).await?;
            let pods = pods::pods_for_deployment(cluster, &name, namespace).await?;
            Output::Map(pods::pod_logs(cluster, &pods, namespace).await?)
        }
    };
    Ok(output)
}
