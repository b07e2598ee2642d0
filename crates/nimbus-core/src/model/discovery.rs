//! DiscoveryRecord — the (joinToken, serviceURL) pair published to the
//! parameter store under names derived from the cluster name.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub join_token: String,
    pub service_url: String,
}

/// Sanitise a cluster name for use in a parameter-store path: keep only
/// `[A-Za-z0-9-]`, per §6.
pub fn sanitize_cluster_name(cluster_name: &str) -> String {
    cluster_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

pub fn token_param_name(cluster_name: &str) -> String {
    format!("/{}/token", sanitize_cluster_name(cluster_name))
}

pub fn service_param_name(cluster_name: &str) -> String {
    format!("/{}/service", sanitize_cluster_name(cluster_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_disallowed_characters() {
        assert_eq!(sanitize_cluster_name("my cluster_1!"), "mycluster1");
    }

    #[test]
    fn param_names_are_scoped_by_cluster() {
        assert_eq!(token_param_name("prod"), "/prod/token");
        assert_eq!(service_param_name("prod"), "/prod/service");
    }
}
