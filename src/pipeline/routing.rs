use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::error::{PipelineError, misconfigured_client, unknown_client};

/// Routing entry for one client. Field names match the client matrix wire
/// format used by the surrounding deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientRoute {
    #[serde(default)]
    pub teamwork_project_id: Option<String>,
    #[serde(default)]
    pub default_assignees: Vec<String>,
    #[serde(default)]
    pub role_ids: Vec<String>,
    #[serde(default)]
    pub default_role_ids: Vec<String>,
}

impl ClientRoute {
    /// Notification audience: explicit role ids, falling back to the
    /// client's defaults. `None` means the notify step is skipped.
    pub fn notify_roles(&self) -> Option<&[String]> {
        if !self.role_ids.is_empty() {
            Some(&self.role_ids)
        } else if !self.default_role_ids.is_empty() {
            Some(&self.default_role_ids)
        } else {
            None
        }
    }
}

/// Immutable client-id → route mapping, loaded once at process start and
/// shared read-only with every pipeline instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    clients: BTreeMap<String, ClientRoute>,
}

impl RoutingTable {
    pub fn new(clients: BTreeMap<String, ClientRoute>) -> Self {
        Self { clients }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get(&self, client_id: &str) -> Option<&ClientRoute> {
        self.clients.get(client_id)
    }

    /// Resolves a client to a route carrying a tracker project id.
    ///
    /// Returns the route together with its project id so callers do not
    /// need to re-check the optional field.
    pub fn resolve(&self, client_id: &str) -> Result<(&ClientRoute, &str), PipelineError> {
        let route = self.clients.get(client_id).ok_or_else(|| {
            unknown_client(format!("unknown client '{client_id}' in execution intent"))
        })?;
        let project_id = route
            .teamwork_project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                misconfigured_client(format!(
                    "client '{client_id}' is missing a teamwork_project_id mapping"
                ))
            })?;
        Ok((route, project_id))
    }
}

impl FromIterator<(String, ClientRoute)> for RoutingTable {
    fn from_iter<I: IntoIterator<Item = (String, ClientRoute)>>(iter: I) -> Self {
        Self {
            clients: iter.into_iter().collect(),
        }
    }
}
