use anyhow::Result;
use memlog::config::MemlogConfig;
use memlog::memory::prompt::context_line;

/// Run a similarity search from the terminal.
pub async fn search(config: &MemlogConfig, query: &str, limit: Option<usize>) -> Result<()> {
    let service = memlog::server::build_service(config).await?;
    let results = service.search(query, limit).await?;

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", results.len());
    for (i, result) in results.iter().enumerate() {
        println!("  {}. {}", i + 1, context_line(result));
        if let Some(ts) = result.payload.get("timestamp").and_then(|t| t.as_str()) {
            println!("     at {ts}");
        }
    }

    Ok(())
}

/// Answer a question the same way `POST /chat` does.
pub async fn ask(config: &MemlogConfig, question: &str) -> Result<()> {
    let service = memlog::server::build_service(config).await?;
    let answer = service.chat(question).await?;

    println!("{}", answer.response.trim_end());
    println!();
    println!("({} memories used)", answer.found_memories);
    Ok(())
}
