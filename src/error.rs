use kube::config::KubeconfigError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid label argument `{0}`")]
    InvalidLabel(String),

    #[error("invalid {kind} `{value}`")]
    InvalidName { kind: &'static str, value: String },

    #[error("arguments must be either labels or names, not both")]
    MixedTargets,

    #[error("there must be at least one targeting argument (either names or labels)")]
    EmptyTarget,

    #[error("invalid scale `{0}`, expected a non-negative integer")]
    InvalidScale(String),

    #[error("no deployment in namespace {namespace} matches {target}")]
    NoMatch { namespace: String, target: String },

    #[error("{count} deployments in namespace {namespace} match {target}, expected exactly one")]
    Ambiguous {
        namespace: String,
        target: String,
        count: usize,
    },

    #[error("deployment {0} has a selector that cannot be used to list its pods")]
    UnsupportedSelector(String),

    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] KubeconfigError),

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("failed to encode scale: {0}")]
    Encode(#[from] k8s_openapi::serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
