use restaurant_pos_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    gateway::{CustomerDirectory, NewCustomer, PgCustomerDirectory},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = orm_from_pool(&pool);
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let directory = PgCustomerDirectory::new(orm);
    let customers = [
        ("0500000001", "Sara Al-Harbi", Some("Olaya St, Riyadh")),
        ("0500000002", "Omar Khalid", None),
        ("0500000003", "Lina Haddad", Some("King Fahd Rd, Riyadh")),
    ];

    for (phone, name, address) in customers {
        let customer = directory
            .upsert(NewCustomer {
                phone: phone.to_string(),
                name: name.to_string(),
                address: address.map(str::to_string),
            })
            .await?;
        println!("Ensured customer {} ({})", customer.name, customer.phone);
    }

    println!("Seed completed");
    Ok(())
}
