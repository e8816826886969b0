mod base;
mod config;
mod data;
mod models;
mod services;
mod utils;
mod web;

use anyhow::Result;
use log::info;

use config::BlogConfig;
use data::Database;
use models::UserId;
use web::{ArticleForm, Blog, Identity, ListParams, Method};

fn main() -> Result<()> {
    // Set up logging
    env_logger::init();
    info!("Starting inkpost...");

    let config = BlogConfig::default();

    // Ensure the data directory exists before trying to open the database file
    utils::ensure_directory_exists(&config.database_path)?;

    info!("Initializing database...");
    let database = Database::new(&config.database_path)?;
    let blog = Blog::new(&database, config);

    // Seed a welcome article on first launch so the listing has
    // something to show
    let listing = blog.article_list(&ListParams::default())?;
    if listing.articles.items.is_empty() {
        info!("Empty store, seeding a welcome article");
        let form = ArticleForm {
            title: "Welcome to inkpost".into(),
            body: "# Hello\n\nWrite articles in **Markdown**.\n\n\
                   ```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n"
                .into(),
            column: ArticleForm::NO_COLUMN.into(),
            tags: vec!["meta".into()],
            attachment: None,
        };
        blog.article_create(Identity::User(UserId(1)), Method::Post, Some(&form))?;
    }

    let listing = blog.article_list(&ListParams::default())?;
    println!(
        "Articles (page {} of {}):",
        listing.articles.number, listing.articles.num_pages
    );
    for article in &listing.articles.items {
        println!(
            "  #{} {} ({}, {} views)",
            article.id,
            article.title,
            utils::format_datetime(article.created),
            article.total_views
        );
    }

    if let Some(first) = listing.articles.items.first() {
        let detail = blog.article_detail(first.id)?;
        println!("\n--- {} ---", detail.article.title);
        println!("{}", detail.body.html);
    }

    Ok(())
}
