//! Model listing functionality
//!
//! Prints the models the server reports, in the order discovery returned
//! them. Discovery never fails, so a dead server still prints the fallback
//! set it would chat with.

use std::error::Error;

use crate::api::models::discover_models;

pub async fn list_models(base_url: &str) -> Result<(), Box<dyn Error>> {
    let client = reqwest::Client::new();
    let models = discover_models(&client, base_url).await;

    println!("🤖 Available models at {base_url}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    for model in &models {
        println!("  • {model}");
    }
    println!();
    println!("Found {} models. The first one is selected at startup.", models.len());

    Ok(())
}
