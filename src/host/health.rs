use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::endpoint::Endpoint;

/// Last observed state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeState {
    /// Last probe (or request) succeeded
    Online,
    /// Last probe (or request) failed
    Offline,
    /// Not probed yet
    Unknown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Online => "ONLINE",
            NodeState::Offline => "OFFLINE",
            NodeState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// One observation of a node's health.
///
/// Immutable: a state change means a new `NodeHealth`. The timestamp is taken
/// when the observation is made, not when it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeHealth {
    endpoint: Endpoint,
    state: NodeState,
    observed_at: DateTime<Utc>,
}

impl NodeHealth {
    pub fn new(endpoint: Endpoint, state: NodeState) -> Self {
        Self {
            endpoint,
            state,
            observed_at: Utc::now(),
        }
    }

    pub fn online(endpoint: Endpoint) -> Self {
        Self::new(endpoint, NodeState::Online)
    }

    pub fn offline(endpoint: Endpoint) -> Self {
        Self::new(endpoint, NodeState::Offline)
    }

    pub fn unknown(endpoint: Endpoint) -> Self {
        Self::new(endpoint, NodeState::Unknown)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn into_endpoint(self) -> Endpoint {
        self.endpoint
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn is_online(&self) -> bool {
        self.state == NodeState::Online
    }

    /// Time elapsed since this observation was made
    pub fn age(&self) -> Duration {
        (Utc::now() - self.observed_at).to_std().unwrap_or_default()
    }
}

impl fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.endpoint, self.state)
    }
}

/// Point-in-time copy of every tracked node's health.
///
/// Later registry updates are not reflected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    nodes: Vec<NodeHealth>,
}

impl ClusterInfo {
    pub fn new(nodes: impl IntoIterator<Item = NodeHealth>) -> Self {
        let mut nodes: Vec<NodeHealth> = nodes.into_iter().collect();
        nodes.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        Self { nodes }
    }

    /// All observations, ordered by endpoint
    pub fn nodes(&self) -> &[NodeHealth] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<NodeHealth> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if at least one node is online
    pub fn is_healthy(&self) -> bool {
        self.nodes.iter().any(NodeHealth::is_online)
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<&NodeHealth> {
        self.nodes.iter().find(|n| &n.endpoint == endpoint)
    }

    pub fn count(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state == state).count()
    }

    pub fn online(&self) -> impl Iterator<Item = &Endpoint> {
        self.nodes
            .iter()
            .filter(|n| n.is_online())
            .map(NodeHealth::endpoint)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeHealth> {
        self.nodes.iter()
    }
}

impl fmt::Display for ClusterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ClusterInfo {
    type Item = &'a NodeHealth;
    type IntoIter = std::slice::Iter<'a, NodeHealth>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_health_creation() {
        let before = Utc::now();
        let health = NodeHealth::online(Endpoint::new("es-1", 9200));
        assert!(health.is_online());
        assert_eq!(health.state(), NodeState::Online);
        assert!(health.observed_at() >= before);
        assert!(health.age() < Duration::from_secs(5));

        assert!(!NodeHealth::offline(Endpoint::new("es-1", 9200)).is_online());
        assert!(!NodeHealth::unknown(Endpoint::new("es-1", 9200)).is_online());
    }

    #[test]
    fn test_cluster_info_is_healthy() {
        let info = ClusterInfo::new(vec![
            NodeHealth::offline(Endpoint::new("b", 9200)),
            NodeHealth::unknown(Endpoint::new("c", 9200)),
        ]);
        assert!(!info.is_healthy());

        let info = ClusterInfo::new(vec![
            NodeHealth::offline(Endpoint::new("b", 9200)),
            NodeHealth::online(Endpoint::new("a", 9200)),
        ]);
        assert!(info.is_healthy());
        assert_eq!(info.online().collect::<Vec<_>>(), vec![&Endpoint::new("a", 9200)]);
        assert_eq!(info.count(NodeState::Offline), 1);
    }

    #[test]
    fn test_cluster_info_ordering_and_display() {
        let info = ClusterInfo::new(vec![
            NodeHealth::offline(Endpoint::new("b", 9200)),
            NodeHealth::online(Endpoint::new("a", 9200)),
        ]);
        assert_eq!(info.nodes()[0].endpoint().host(), "a");
        assert_eq!(info.to_string(), "a:9200=ONLINE, b:9200=OFFLINE");
        assert!(info.get(&Endpoint::new("b", 9200)).is_some());
        assert!(info.get(&Endpoint::new("z", 9200)).is_none());
    }

    #[test]
    fn test_state_serializes_uppercase() {
        let json = serde_json::to_string(&NodeState::Offline).unwrap();
        assert_eq!(json, "\"OFFLINE\"");
    }
}
