//! Example walking the financial pipeline by hand.
//!
//! This example shows how to:
//! 1. Resolve a company name to its registry id
//! 2. Pick the latest accounts filing and its XHTML rendering
//! 3. Download it and extract the numeric inline-XBRL facts
//!
//! Run with:
//! ```bash
//! COMPANIES_HOUSE_API_KEY=... cargo run --example latest_accounts_facts -- "Acme Ltd"
//! ```

use ledgerline_data::registry::{DocumentResolver, RegistrySource};
use ledgerline_data::{DocumentFetcher, FactExtractor, RegistryClient, RegistryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let name = std::env::args().nth(1).unwrap_or_else(|| "Acme Ltd".to_string());
    let api_key = std::env::var("COMPANIES_HOUSE_API_KEY")?;

    let client = RegistryClient::new(RegistryConfig::new(api_key))?;

    println!("Searching for {}...", name);
    let company_id = client.search_company(&name).await?;
    println!("Company number: {}", company_id);

    let history = client.filing_history(&company_id).await?;
    let filing = history.latest_accounts()?;
    println!("Latest accounts filed: {:?}", filing.date);

    let document = DocumentResolver::new(&client).resolve(filing).await?;
    let artifact = DocumentFetcher::new()
        .fetch(&client, &company_id, &document)
        .await?;
    println!("Downloaded {} bytes", artifact.len());

    let facts = FactExtractor::new().extract_artifact(artifact)?;
    println!("\n{} facts, {} observations", facts.len(), facts.observation_count());
    for (name, observations) in facts.iter().take(10) {
        for (context_ref, value) in observations {
            println!("  {:<60} {:<20} {}", name, context_ref, value);
        }
    }

    Ok(())
}
