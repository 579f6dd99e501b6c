//! Maps an incoming Host header to a tenant. Custom domains win over
//! subdomains of the root domain; the bare root (and local hosts) serve the
//! agent-creation front end.

use std::sync::Arc;

use crate::db::Database;
use crate::models::Agent;

pub const DEFAULT_BUNDLE: &str = "ask-agent";

#[derive(Debug)]
pub enum Resolution {
    /// Bare root domain, serves the creation front end.
    Root,
    /// A provisioned agent with the front-end bundle its domain selects.
    Tenant { agent: Agent, bundle: String },
    NotFound,
}

pub struct Resolver {
    db: Arc<Database>,
    root_domain: String,
}

impl Resolver {
    pub fn new(db: Arc<Database>, root_domain: &str) -> Self {
        Self {
            db,
            root_domain: root_domain.to_lowercase(),
        }
    }

    fn is_root_host(&self, host: &str) -> bool {
        host == self.root_domain || host == "localhost" || host == "127.0.0.1"
    }

    pub fn resolve(&self, host: &str) -> Result<Resolution, String> {
        let host = host
            .split(':')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        // Custom domain mapping takes priority over everything else.
        if let Some(domain) = self
            .db
            .get_domain(&host)
            .map_err(|e| format!("Domain lookup failed: {}", e))?
        {
            let subdomain = match domain.subdomain {
                Some(subdomain) => subdomain,
                // The agent this domain pointed at was deleted.
                None => return Ok(Resolution::NotFound),
            };
            let agent = self
                .db
                .get_agent(&subdomain)
                .map_err(|e| format!("Agent lookup failed: {}", e))?;
            return Ok(match agent {
                Some(agent) => Resolution::Tenant {
                    agent,
                    bundle: domain
                        .custom_script_path
                        .unwrap_or_else(|| DEFAULT_BUNDLE.to_string()),
                },
                None => Resolution::NotFound,
            });
        }

        if self.is_root_host(&host) {
            return Ok(Resolution::Root);
        }

        let candidate = host.split('.').next().unwrap_or_default();
        if candidate.is_empty() {
            return Ok(Resolution::NotFound);
        }

        let agent = self
            .db
            .get_agent(candidate)
            .map_err(|e| format!("Agent lookup failed: {}", e))?;
        Ok(match agent {
            Some(agent) => Resolution::Tenant {
                agent,
                bundle: DEFAULT_BUNDLE.to_string(),
            },
            None => Resolution::NotFound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProvisionRecord;
    use crate::models::Agent;

    fn seeded_resolver() -> Resolver {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.provision_tenant(&ProvisionRecord {
            agent: Agent {
                subdomain: "gardener".to_string(),
                name: "Gardener".to_string(),
                titles: "Green Thumb".to_string(),
                suggestions: "roses".to_string(),
                prompt: "You garden.".to_string(),
                workflow: String::new(),
                image_cid: None,
            },
            domains: vec![
                ("plants.example".to_string(), None),
                ("fancy.example".to_string(), Some("garden-ui".to_string())),
            ],
            links: vec![],
            twitter_bot: None,
            telegram_bot: None,
        })
        .unwrap();
        Resolver::new(db, "mement.fun")
    }

    #[test]
    fn test_resolve_root_hosts() {
        let resolver = seeded_resolver();
        for host in ["mement.fun", "mement.fun:8080", "localhost:8080", "127.0.0.1"] {
            assert!(matches!(resolver.resolve(host).unwrap(), Resolution::Root));
        }
    }

    #[test]
    fn test_resolve_subdomain_of_root() {
        let resolver = seeded_resolver();
        match resolver.resolve("gardener.mement.fun").unwrap() {
            Resolution::Tenant { agent, bundle } => {
                assert_eq!(agent.subdomain, "gardener");
                assert_eq!(bundle, DEFAULT_BUNDLE);
            }
            other => panic!("expected tenant, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_custom_domain() {
        let resolver = seeded_resolver();
        match resolver.resolve("plants.example").unwrap() {
            Resolution::Tenant { agent, bundle } => {
                assert_eq!(agent.subdomain, "gardener");
                assert_eq!(bundle, DEFAULT_BUNDLE);
            }
            other => panic!("expected tenant, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_custom_domain_with_bundle_override() {
        let resolver = seeded_resolver();
        match resolver.resolve("fancy.example").unwrap() {
            Resolution::Tenant { bundle, .. } => assert_eq!(bundle, "garden-ui"),
            other => panic!("expected tenant, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_hosts() {
        let resolver = seeded_resolver();
        assert!(matches!(
            resolver.resolve("nobody.mement.fun").unwrap(),
            Resolution::NotFound
        ));
        assert!(matches!(
            resolver.resolve("unknown.example").unwrap(),
            Resolution::NotFound
        ));
    }

    #[test]
    fn test_resolve_domain_of_deleted_agent() {
        let resolver = seeded_resolver();
        resolver.db.delete_agent("gardener").unwrap();
        assert!(matches!(
            resolver.resolve("plants.example").unwrap(),
            Resolution::NotFound
        ));
    }
}
