//! Domains command handler.

use clap::Args;
use policyqa_core::{AppError, AppResult};
use policyqa_retrieval::{PolicyDomain, RetrievalLayout};

/// List supported policy sets
#[derive(Args, Debug)]
pub struct DomainsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn strategy_name(domain: PolicyDomain) -> &'static str {
    match domain.layout() {
        RetrievalLayout::PerDocument { .. } => "dynamic",
        RetrievalLayout::Consolidated { .. } => "consolidated",
    }
}

fn domains_json() -> serde_json::Value {
    let domains: Vec<_> = PolicyDomain::ALL
        .iter()
        .map(|domain| {
            serde_json::json!({
                "name": domain.as_str(),
                "strategy": strategy_name(*domain),
                "requiredKeys": domain.required_keys()
            })
        })
        .collect();
    serde_json::Value::Array(domains)
}

impl DomainsCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing domains command");

        if self.json {
            let json = serde_json::to_string_pretty(&domains_json())
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        for domain in PolicyDomain::ALL {
            println!("{:<6} {}", domain.as_str(), strategy_name(domain));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domains_json() {
        let json = domains_json();
        assert_eq!(json[0]["name"], "DOAD");
        assert_eq!(json[0]["strategy"], "dynamic");
        assert_eq!(json[1]["name"], "LEAVE");
        assert_eq!(json[1]["requiredKeys"][1], "leave/consolidated_policies.md");
    }
}
