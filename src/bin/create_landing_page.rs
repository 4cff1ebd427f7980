use std::sync::Arc;

use anyhow::{Context, Result};
use applied_ai::{
    config::ConfigLoader,
    db,
    telemetry,
    repositories::landing_page::{LandingPageInput, LandingPageRepository},
};
use clap::Parser;

/// Create a landing page unless one with the slug already exists
#[derive(Debug, Parser)]
#[command(name = "create_landing_page", version)]
struct Args {
    /// Title of the landing page
    title: String,
    /// URL slug for the landing page
    slug: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Content delivered when the visitor completes the flow
    #[arg(long, default_value = "Your template content will appear here.")]
    template: String,
    /// MailerLite group id; repeat for several groups, first one is primary
    #[arg(long = "group-id")]
    group_ids: Vec<String>,
    /// Base URL of the website, used to print the page link
    #[arg(long, default_value = "http://localhost:3010")]
    site_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;
    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::run_migrations(&db).await?;

    let repo = LandingPageRepository::new(Arc::new(db));
    if repo
        .find_by_slug(&args.slug)
        .await
        .context("looking up landing page")?
        .is_some()
    {
        println!("Landing page with slug \"{}\" already exists", args.slug);
        return Ok(());
    }

    let page = repo
        .create(LandingPageInput {
            title: args.title,
            slug: args.slug,
            description: args.description,
            template_content: Some(args.template),
            mailerlite_group_ids: args
                .group_ids
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            is_active: true,
        })
        .await
        .context("creating landing page")?;

    println!("Successfully created landing page: {}", page.title);
    println!(
        "URL: {}/landing/{}",
        args.site_url.trim_end_matches('/'),
        page.slug
    );
    Ok(())
}
