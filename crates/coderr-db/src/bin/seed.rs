//! # Seed Data Generator
//!
//! Populates the database with demo accounts and offers for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./coderr.db
//! cargo run -p coderr-db --bin seed
//!
//! # Specify database path and demo password
//! cargo run -p coderr-db --bin seed -- --db ./data/coderr.db --password secret
//! ```
//!
//! ## Generated Data
//! - `demo_business` (business profile) with one offer per entry in [`OFFERS`]
//! - `demo_customer` (customer profile)
//! - `admin` (staff account, no profile; the only role that may delete orders)

use std::env;

use coderr_core::catalog::{NewOffer, OfferDetailInput, OfferInput};
use coderr_core::{Money, OfferType, ProfileKind};
use coderr_db::credentials::hash_password;
use coderr_db::{Database, DbConfig, NewUserRecord};

/// Offer title, description and basic/standard/premium prices in whole units.
const OFFERS: &[(&str, &str, [i64; 3])] = &[
    ("Logo Design", "Distinctive logos for small businesses.", [100, 200, 500]),
    ("Website Development", "Responsive websites from landing page to shop.", [400, 900, 2000]),
    ("SEO Audit", "Technical and content audit with action plan.", [80, 150, 300]),
    ("Illustration", "Custom illustrations for print and web.", [60, 120, 250]),
    ("Copywriting", "Product and landing page copy in German or English.", [50, 110, 220]),
];

/// Revisions and delivery days per tier.
const TIERS: [(OfferType, i64, i64); 3] = [
    (OfferType::Basic, 2, 7),
    (OfferType::Standard, 5, 5),
    (OfferType::Premium, 10, 3),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./coderr.db");
    let mut password = String::from("asdasd");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Coderr Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./coderr.db)");
                println!("  -p, --password <SECRET>  Password for demo accounts (default: asdasd)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Coderr Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().find_credentials("demo_business").await?.is_some() {
        println!("⚠ Demo accounts already exist");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let password_hash = hash_password(&password)?;
    let account = |username: &str, first_name: &str, last_name: &str| NewUserRecord {
        username: username.to_string(),
        email: format!("{username}@coderr.example"),
        password_hash: password_hash.clone(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    };

    let business_id = db
        .users()
        .create_account(&account("demo_business", "Kevin", "Meyer"), ProfileKind::Business)
        .await?;
    let customer_id = db
        .users()
        .create_account(&account("demo_customer", "Andrey", "Schulz"), ProfileKind::Customer)
        .await?;
    let admin_id = db.users().create_staff(&account("admin", "", "")).await?;

    println!("✓ Created demo_business (id {})", business_id);
    println!("✓ Created demo_customer (id {})", customer_id);
    println!("✓ Created admin (id {})", admin_id);

    println!();
    println!("Generating offers...");

    for (title, description, prices) in OFFERS {
        let offer = NewOffer::validate(offer_input(title, description, prices))
            .map_err(|e| format!("invalid seed offer {title}: {e}"))?;
        let offer_id = db.offers().create(business_id, &offer).await?;
        println!("  {} (id {})", title, offer_id);
    }

    let info = db.stats().base_info().await?;
    println!();
    println!(
        "✓ Seed complete: {} business profiles, {} offers",
        info.business_profile_count, info.offer_count
    );

    db.close().await;
    Ok(())
}

/// Builds an offer payload the same way a client would submit it.
fn offer_input(title: &str, description: &str, prices: &[i64; 3]) -> OfferInput {
    let details = TIERS
        .iter()
        .zip(prices)
        .map(|((offer_type, revisions, delivery), price)| OfferDetailInput {
            title: Some(format!("{title} {offer_type}")),
            revisions: Some(*revisions),
            delivery_time_in_days: Some(*delivery),
            price: Some(Money::from_units(*price)),
            features: Some(vec![title.to_string(), format!("{offer_type} support")]),
            offer_type: Some(offer_type.as_str().to_string()),
        })
        .collect();

    OfferInput {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        image: None,
        details: Some(details),
    }
}
