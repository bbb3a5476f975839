use crate::config::DEFAULT_USER_AGENTS;
use rand::seq::SliceRandom;

/// Static set of browser user agents, selected uniformly at random
///
/// The set never mutates after construction, so selection needs no
/// synchronization beyond shared references.
#[derive(Debug, Clone)]
pub struct UserAgentSet {
    agents: Vec<String>,
}

impl UserAgentSet {
    /// Creates a set from the given agents, or the built-in list if empty
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            agents
        };
        Self { agents }
    }

    /// Picks a user agent uniformly at random. Never fails.
    pub fn select(&self) -> &str {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    /// Number of user agents in the set
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the set is empty (never true after `new`)
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for UserAgentSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
