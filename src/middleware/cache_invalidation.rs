// Cache invalidation pairing system. Endpoints are grouped so that a
// mutation clears every cached read it can influence in one sweep; the
// premium_facts group in particular must always be cleared as a whole set.
use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::db::cache::CacheHelper;

#[derive(Debug, Clone)]
pub struct CacheGroup {
    pub name: String,
    pub patterns: Vec<String>,
    pub get_endpoints: Vec<String>,
    pub mutate_endpoints: Vec<String>,
}

impl CacheGroup {
    pub fn new(
        name: &str,
        patterns: Vec<&str>,
        get_endpoints: Vec<&str>,
        mutate_endpoints: Vec<&str>,
    ) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            get_endpoints: get_endpoints.iter().map(|s| s.to_string()).collect(),
            mutate_endpoints: mutate_endpoints.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct CacheInvalidationConfig {
    pub groups: Vec<CacheGroup>,
}

impl CacheInvalidationConfig {
    pub fn new() -> Self {
        let groups = vec![
            // PREMIUM FACTS - the subscription row, the authoritative tag and
            // the caller profile are one set; any access-changing mutation
            // clears all three so no stale mix is ever served.
            CacheGroup::new(
                "premium_facts",
                vec![
                    "cache:GET:/api/premium/subscription*",
                    "cache:GET:/api/premium/status*",
                    "cache:GET:/api/users/me*",
                    "cache:GET:/api/premium/admin/diagnosis*",
                ],
                vec![
                    "GET /api/premium/subscription",
                    "GET /api/premium/status",
                    "GET /api/users/me",
                    "GET /api/users/me/is-admin",
                    "GET /api/premium/admin/diagnosis/*",
                ],
                vec![
                    "POST /api/premium/subscription/activate",
                    "POST /api/premium/admin/grant",
                    "POST /api/premium/admin/revoke",
                    "POST /api/referrals/redeem",
                    "POST /api/users/terms/accept",
                    "PUT /api/users/me",
                    "POST /api/auth/logout",
                ],
            ),
            // REFERRAL CODE ADMIN VIEW - independent lifecycle from any
            // user's redemption window.
            CacheGroup::new(
                "referral_codes",
                vec!["cache:GET:/api/referrals/admin*"],
                vec!["GET /api/referrals/admin/codes"],
                vec![
                    "POST /api/referrals/admin/codes",
                    "POST /api/referrals/admin/codes/revoke",
                ],
            ),
        ];

        Self { groups }
    }

    pub fn find_group_for_request(&self, method: &str, path: &str) -> Option<&CacheGroup> {
        let request_key = format!("{} {}", method, path);

        for group in &self.groups {
            if method == "GET" {
                for get_endpoint in &group.get_endpoints {
                    if self.matches_endpoint(&request_key, get_endpoint) {
                        return Some(group);
                    }
                }
            }

            if method == "POST" || method == "PUT" || method == "DELETE" {
                for mutate_endpoint in &group.mutate_endpoints {
                    if self.matches_endpoint(&request_key, mutate_endpoint) {
                        return Some(group);
                    }
                }
            }
        }

        None
    }

    pub fn get_invalidation_patterns(&self, method: &str, path: &str) -> Vec<String> {
        if method != "POST" && method != "PUT" && method != "DELETE" {
            return vec![];
        }

        if let Some(group) = self.find_group_for_request(method, path) {
            return group.patterns.clone();
        }
        vec![]
    }

    fn matches_endpoint(&self, request: &str, endpoint: &str) -> bool {
        if endpoint.contains('*') {
            let pattern = endpoint.replace('*', ".*");
            let regex = regex::Regex::new(&format!("^{}$", pattern))
                .unwrap_or_else(|_| regex::Regex::new(r".*").unwrap());
            regex.is_match(request)
        } else {
            request == endpoint
        }
    }
}

pub async fn invalidate_cache_for_request(
    redis_client: &Arc<ConnectionManager>,
    config: &CacheInvalidationConfig,
    method: &str,
    path: &str,
) -> Result<(), redis::RedisError> {
    let patterns = config.get_invalidation_patterns(method, path);

    if !patterns.is_empty() {
        tracing::info!(
            "Invalidating cache for {} {} - patterns: {:?}",
            method,
            path,
            patterns
        );

        for pattern in patterns {
            CacheHelper::delete_pattern(redis_client, &pattern).await?;
        }
    }

    Ok(())
}

pub fn should_cache_request(method: &str, path: &str, config: &CacheInvalidationConfig) -> bool {
    if method != "GET" {
        return false;
    }

    config.find_group_for_request(method, path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_access_mutation_clears_the_whole_fact_set() {
        let config = CacheInvalidationConfig::new();
        let fact_patterns = [
            "cache:GET:/api/premium/subscription*",
            "cache:GET:/api/premium/status*",
            "cache:GET:/api/users/me*",
        ];

        for (method, path) in [
            ("POST", "/api/premium/subscription/activate"),
            ("POST", "/api/premium/admin/grant"),
            ("POST", "/api/premium/admin/revoke"),
            ("POST", "/api/referrals/redeem"),
            ("POST", "/api/users/terms/accept"),
            ("PUT", "/api/users/me"),
        ] {
            let patterns = config.get_invalidation_patterns(method, path);
            for fact_pattern in fact_patterns {
                assert!(
                    patterns.iter().any(|p| p == fact_pattern),
                    "{} {} must invalidate {}",
                    method,
                    path,
                    fact_pattern
                );
            }
        }
    }

    #[test]
    fn fact_reads_are_cacheable_and_mutations_are_not() {
        let config = CacheInvalidationConfig::new();
        assert!(should_cache_request("GET", "/api/premium/status", &config));
        assert!(should_cache_request("GET", "/api/users/me", &config));
        assert!(should_cache_request(
            "GET",
            "/api/premium/admin/diagnosis/w3gef-xyaaa-aaaab-qacda-cai",
            &config
        ));
        assert!(!should_cache_request("POST", "/api/referrals/redeem", &config));
        assert!(!should_cache_request("GET", "/api/predictions", &config));
    }

    #[test]
    fn reads_trigger_no_invalidation() {
        let config = CacheInvalidationConfig::new();
        assert!(config
            .get_invalidation_patterns("GET", "/api/premium/status")
            .is_empty());
    }
}
