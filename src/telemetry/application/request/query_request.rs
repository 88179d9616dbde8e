use std::time::{SystemTime, UNIX_EPOCH};

/// Which label a query's target names are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// Targets are workload instance (pod) names.
    Instance,
    /// Targets are node names.
    Node,
}

impl QueryScope {
    pub fn label(&self) -> &'static str {
        match self {
            QueryScope::Instance => "pod",
            QueryScope::Node => "node",
        }
    }
}

/// One instant query over a set of targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub scope: QueryScope,
    /// Names (or regex fragments such as `.*`) joined into one alternation.
    pub targets: Vec<String>,
}

impl QueryRequest {
    pub fn new<S: AsRef<str>>(scope: QueryScope, targets: &[S]) -> Self {
        Self {
            scope,
            targets: targets.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    /// `{__name__=~"m1|m2", <label>=~"t1|t2"}`
    pub fn expression<S: AsRef<str>>(&self, metric_names: &[S]) -> String {
        format!(
            r#"{{__name__=~"{}", {}=~"{}"}}"#,
            join(metric_names),
            self.scope.label(),
            join(&self.targets)
        )
    }
}

fn join<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("|")
}

/// Current unix time in whole seconds, as sent in the `time` parameter.
pub fn evaluation_time() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}
