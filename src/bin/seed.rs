//! Create or update a post group. Groups have no public create page.
//! Run with: cargo run --bin seed

use yatube::config::Config;
use yatube::db::Database;
use yatube::models::NewGroup;
use yatube::repository::{BlogRepository, PgBlogRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let slug = std::env::var("GROUP_SLUG").unwrap_or_else(|_| "general".to_string());
    let title = std::env::var("GROUP_TITLE").unwrap_or_else(|_| "General".to_string());
    let description = std::env::var("GROUP_DESCRIPTION")
        .unwrap_or_else(|_| "Posts that fit no other group".to_string());

    if slug.trim().is_empty() || title.trim().is_empty() {
        anyhow::bail!("GROUP_SLUG and GROUP_TITLE must not be blank");
    }

    println!("Connecting to database...");
    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;
    println!("Connected successfully!");

    let repo = PgBlogRepository::new(db.pg);
    let group = repo
        .upsert_group(NewGroup {
            slug,
            title,
            description,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save group: {}", e))?;

    println!("\n========================================");
    println!("Group Ready!");
    println!("========================================");
    println!("Id:    {}", group.id);
    println!("Slug:  {}", group.slug);
    println!("Title: {}", group.title);
    println!("URL:   /group/{}/", group.slug);
    println!("========================================");

    Ok(())
}
