use chrono::Duration;
use envconfig::Envconfig;
use rand::Rng;
use sqlx::SqlitePool;

use medstock::config::SeedConfig;
use medstock::db::{self, models::AdministrationType, models::CountType, models::NewMedicine};
use medstock::services::admin::{self, AdminError};
use medstock::utils::today;

struct SeedMedicine {
    name: &'static str,
    composition: &'static str,
    category: &'static str,
    administration_type: AdministrationType,
    count_type: CountType,
    low_stock_threshold: i64,
}

const fn seed(
    name: &'static str,
    composition: &'static str,
    category: &'static str,
    administration_type: AdministrationType,
    count_type: CountType,
    low_stock_threshold: i64,
) -> SeedMedicine {
    SeedMedicine {
        name,
        composition,
        category,
        administration_type,
        count_type,
        low_stock_threshold,
    }
}

const SEED_MEDICINES: &[SeedMedicine] = &[
    seed("Aspirin", "Acetylsalicylic acid 75mg", "Antiplatelet", AdministrationType::Oral, CountType::Tablet, 100),
    seed("Amoxicillin", "Amoxicillin 500mg", "Antibiotic", AdministrationType::Oral, CountType::Capsule, 60),
    seed("Amoxil", "Amoxicillin 250mg/5ml", "Antibiotic", AdministrationType::Oral, CountType::Bottle, 10),
    seed("Lisinopril", "Lisinopril 10mg", "Antihypertensive", AdministrationType::Oral, CountType::Tablet, 60),
    seed("Levothyroxine", "Levothyroxine 50mcg", "Thyroid hormone", AdministrationType::Oral, CountType::Tablet, 60),
    seed("Metformin", "Metformin 500mg", "Antidiabetic", AdministrationType::Oral, CountType::Tablet, 120),
    seed("Amlodipine", "Amlodipine 5mg", "Antihypertensive", AdministrationType::Oral, CountType::Tablet, 60),
    seed("Omeprazole", "Omeprazole 20mg", "Proton pump inhibitor", AdministrationType::Oral, CountType::Capsule, 56),
    seed("Salbutamol", "Salbutamol 100mcg", "Bronchodilator", AdministrationType::Inhalation, CountType::Bottle, 5),
    seed("Paracetamol", "Paracetamol 500mg", "Analgesic", AdministrationType::Oral, CountType::Tablet, 200),
    seed("Ibuprofen", "Ibuprofen 200mg", "Analgesic", AdministrationType::Oral, CountType::Tablet, 100),
    seed("Ceftriaxone", "Ceftriaxone 1g", "Antibiotic", AdministrationType::Injection, CountType::Vial, 20),
    seed("Adrenaline", "Epinephrine 1mg/ml", "Emergency", AdministrationType::Injection, CountType::Ampoule, 10),
    seed("Hydrocortisone", "Hydrocortisone 1% cream", "Corticosteroid", AdministrationType::Topical, CountType::Tube, 5),
    seed("Insulin glargine", "Insulin glargine 100U/ml", "Antidiabetic", AdministrationType::Injection, CountType::Vial, 10),
];

/// Loads the demo inventory. Expiration dates and quantities are spread
/// around today so every list filter has something to show.
pub async fn seed_database(pool: &SqlitePool) -> Result<usize, AdminError> {
    let mut rng = rand::thread_rng();
    let today = today();

    for item in SEED_MEDICINES {
        let expiration_date = today + Duration::days(rng.gen_range(-60..=540));
        let quantity = match rng.gen_range(0..10) {
            0 => 0,
            1..=2 => rng.gen_range(1..=item.low_stock_threshold),
            _ => rng.gen_range(item.low_stock_threshold + 1..=item.low_stock_threshold * 6),
        };

        let input = NewMedicine::new(
            item.name,
            item.composition,
            item.category,
            item.low_stock_threshold,
            expiration_date,
        )
        .with_quantity(quantity)
        .with_administration_type(item.administration_type)
        .with_count_type(item.count_type);

        admin::create_medicine(pool, &input).await?;
    }

    Ok(SEED_MEDICINES.len())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenvy::dotenv().ok();

    let config = SeedConfig::init_from_env()?;
    let pool = db::init_db(&config.database_url).await?;

    let count = seed_database(&pool).await?;
    log::info!("Seeded {} medicines into {}", count, config.database_url);
    Ok(())
}
