use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use regex::Regex;

use crate::error::{Error, Result};

pub type LabelMap = BTreeMap<String, String>;

const MAX_NAME_PART: usize = 63;
const MAX_SUBDOMAIN: usize = 253;

static QUALIFIED_NAME: OnceLock<Regex> = OnceLock::new();
static DNS_SUBDOMAIN: OnceLock<Regex> = OnceLock::new();
static DNS_LABEL: OnceLock<Regex> = OnceLock::new();

/// What a command acts on: every deployment carrying a set of labels, or
/// deployments named explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Labels(LabelMap),
    Names(Vec<String>),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Labels(labels) => write!(f, "labels {}", selector_string(labels)),
            Target::Names(names) => write!(f, "names {}", names.join(",")),
        }
    }
}

/// Returns true when every pair of `query` is present with an equal value in
/// `target`. The empty query matches anything.
pub fn is_subset(query: &LabelMap, target: &LabelMap) -> bool {
    query
        .iter()
        .all(|(key, value)| target.get(key) == Some(value))
}

/// Converts `key=value` tokens into a label map, splitting each token at its
/// first `=`.
pub fn split_labels<S: AsRef<str>>(tokens: &[S]) -> Result<LabelMap> {
    tokens
        .iter()
        .map(|token| {
            let token = token.as_ref();
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    Ok((key.to_owned(), value.to_owned()))
                }
                _ => Err(Error::InvalidLabel(token.to_owned())),
            }
        })
        .collect()
}

/// Decides whether a run of tokens is a label selector (`=` in every token)
/// or a list of names (`=` in none of them).
pub fn parse_target<S: AsRef<str>>(tokens: &[S]) -> Result<Target> {
    if tokens.is_empty() {
        return Err(Error::EmptyTarget);
    }
    let mut labelled = 0;
    for token in tokens.iter().map(|token| token.as_ref()) {
        if token.contains('=') {
            if token.starts_with('=') || token.ends_with('=') {
                return Err(Error::InvalidLabel(token.to_owned()));
            }
            labelled += 1;
        }
    }
    match labelled {
        0 => Ok(Target::Names(
            tokens.iter().map(|token| token.as_ref().to_owned()).collect(),
        )),
        n if n == tokens.len() => split_labels(tokens).map(Target::Labels),
        _ => Err(Error::MixedTargets),
    }
}

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static pattern compiles"))
}

fn is_name_part(value: &str) -> bool {
    value.len() <= MAX_NAME_PART
        && pattern(
            &QUALIFIED_NAME,
            r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$",
        )
        .is_match(value)
}

fn is_dns_subdomain(value: &str) -> bool {
    value.len() <= MAX_SUBDOMAIN
        && pattern(
            &DNS_SUBDOMAIN,
            r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$",
        )
        .is_match(value)
}

fn is_dns_label(value: &str) -> bool {
    value.len() <= MAX_NAME_PART
        && pattern(&DNS_LABEL, r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").is_match(value)
}

fn is_label_key(key: &str) -> bool {
    match key.split_once('/') {
        Some((prefix, name)) => is_dns_subdomain(prefix) && is_name_part(name),
        None => is_name_part(key),
    }
}

/// Rejects label keys and values the API server would never accept.
pub fn validate_labels(labels: &LabelMap) -> Result<()> {
    match labels
        .iter()
        .find(|(key, value)| !is_label_key(key) || !is_name_part(value))
    {
        Some((key, value)) => Err(Error::InvalidLabel(format!("{key}={value}"))),
        None => Ok(()),
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if is_dns_subdomain(name) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "deployment name",
            value: name.to_owned(),
        })
    }
}

pub fn validate_namespace(namespace: &str) -> Result<()> {
    if is_dns_label(namespace) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            kind: "namespace",
            value: namespace.to_owned(),
        })
    }
}

/// Flattens a label selector into plain equality labels. Only `matchLabels`
/// and single-valued `In` expressions can be expressed this way.
pub fn selector_to_map(owner: &str, selector: &LabelSelector) -> Result<LabelMap> {
    let mut labels = selector.match_labels.clone().unwrap_or_default();
    for expression in selector.match_expressions.iter().flatten() {
        match (expression.operator.as_str(), expression.values.as_deref()) {
            ("In", Some([value])) => {
                labels.insert(expression.key.clone(), value.clone());
            }
            _ => return Err(Error::UnsupportedSelector(owner.to_owned())),
        }
    }
    Ok(labels)
}

pub fn selector_string(labels: &LabelMap) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
