use quarry_core::connectors::arxiv::ArxivConnector;
use quarry_core::transport::ReqwestFetcher;
use quarry_core::SourceAdapter;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // arXiv doesn't require authentication
    let fetcher = Arc::new(ReqwestFetcher::new()?);
    let arxiv = ArxivConnector::new(fetcher);

    println!("Initialized source: {} ({})", arxiv.source(), arxiv.description());

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "quantum computing".to_string());
    println!("\nSearching arXiv for '{}'...", query);
    println!("GET {}", arxiv.build_search_url(&query, 5));

    let papers = arxiv.fetch(&query, 5).await?;

    println!("\nFound {} papers:", papers.len());
    for (i, paper) in papers.iter().enumerate() {
        println!("{}. {}", i + 1, paper.title);
        println!("   ID: {}", paper.arxiv_id.as_deref().unwrap_or("-"));
        println!("   Published: {}", paper.publish_date);
        if !paper.authors.is_empty() {
            println!("   Authors: {}", paper.authors.join(", "));
        }
        if let Some(doi) = &paper.doi {
            println!("   DOI: {}", doi);
        }
    }

    Ok(())
}
