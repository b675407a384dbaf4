//! The marketplace catalog.

use std::sync::Arc;

use icarus_market_core::{Price, Product, ProductId};

/// Immutable, ordered product list.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Arc<[Product]>,
}

impl Catalog {
    /// A catalog of the given products, in display order.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: products.into(),
        }
    }

    /// The built-in MCP products.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            product(
                "master",
                "Master Incident Manager MCP",
                "Complete orchestrator that calls all service MCPs. One MCP to rule them all!",
                50,
                "🎯",
                &[
                    "Orchestrates all 8 service MCPs",
                    "handle_incident()",
                    "retry_failed_action()",
                    "get_incident_status()",
                ],
                true,
            ),
            product(
                "discord",
                "Discord MCP",
                "Send alerts and notifications to Discord channels",
                5,
                "💬",
                &["send_message()", "Discord API integration", "Webhook support"],
                false,
            ),
            product(
                "slack",
                "Slack MCP",
                "Send messages to Slack channels and threads",
                5,
                "💼",
                &["send_slack()", "Slack API integration", "Channel posting"],
                false,
            ),
            product(
                "twilio",
                "Twilio MCP",
                "Send SMS notifications to on-call engineers",
                5,
                "📱",
                &["send_sms()", "Twilio API integration", "Multi-number support"],
                false,
            ),
            product(
                "warroom",
                "War Room MCP",
                "Create instant meeting rooms for incident response",
                8,
                "📹",
                &[
                    "create_war_room()",
                    "Google Meet integration",
                    "Auto-generate links",
                ],
                false,
            ),
            product(
                "status",
                "Status Page MCP",
                "Update public status pages for customer transparency",
                8,
                "📊",
                &["update_status()", "get_status()", "StatusPage.io integration"],
                false,
            ),
            product(
                "oncall",
                "OnCall Directory MCP",
                "Fetch current on-call engineer from schedules",
                7,
                "👥",
                &[
                    "get_oncall_engineer()",
                    "PagerDuty API integration",
                    "Team rotation support",
                ],
                false,
            ),
            product(
                "ai",
                "AI Remediation MCP",
                "Get AI-powered suggestions for incident resolution",
                10,
                "🧠",
                &[
                    "get_suggestions()",
                    "Claude API integration",
                    "Context-aware analysis",
                ],
                false,
            ),
            product(
                "logger",
                "Blockchain Logger MCP",
                "Immutable incident logging on blockchain",
                12,
                "⛓️",
                &["log_action()", "get_timeline()", "Tamper-proof audit trail"],
                false,
            ),
        ])
    }

    /// All products in display order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Highlighted products.
    pub fn premium(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.premium)
    }

    /// Everything else.
    pub fn standard(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| !p.premium)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn product(
    id: &str,
    name: &str,
    description: &str,
    price: i64,
    icon: &str,
    features: &[&str],
    premium: bool,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        price: Price::weil(price),
        icon: icon.to_string(),
        features: features.iter().map(ToString::to_string).collect(),
        premium,
        target_address: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.products().len(), 9);

        let ids: HashSet<_> = catalog.products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 9, "product ids must be unique");

        let premium: Vec<_> = catalog.premium().map(|p| p.id.as_str()).collect();
        assert_eq!(premium, vec!["master"]);
        assert_eq!(catalog.standard().count(), 8);
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::builtin();
        let logger = catalog.get(&ProductId::new("logger"));
        assert_eq!(logger.map(|p| p.price), Some(Price::weil(12)));
        assert!(catalog.get(&ProductId::new("unknown")).is_none());
    }

    #[test]
    fn test_builtin_products_are_deployable() {
        assert!(
            Catalog::builtin()
                .products()
                .iter()
                .all(|p| p.artifacts().is_some())
        );
    }
}
