use canteen_engine::{
    CartStore, CheckoutCoordinator, Config, DocumentStore, TimeSource, logger,
};
use shared::models::{timeslot, MenuItem};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    std::fs::create_dir_all(&config.work_dir)?;
    let log_dir = format!("{}/logs", config.work_dir);
    logger::init_logger_with_file(&config.log_level, config.is_production(), Some(&log_dir))?;

    tracing::info!(work_dir = %config.work_dir, "Canteen checkout engine starting");

    let store = DocumentStore::open(config.db_path())?;
    if store.list_menu_items()?.is_empty() {
        seed_catalog(&store)?;
    }

    let cart = Arc::new(CartStore::load(store.clone())?);
    let coordinator = CheckoutCoordinator::new(
        store.clone(),
        Arc::clone(&cart),
        config.admission_schedule(),
        TimeSource::new(config.time_api_url.clone(), config.time_fetch_timeout()),
        config.retry_policy(),
    );

    // Demo run: fill the cart and attempt one checkout
    cart.add("adobo", 2)?;
    cart.add("lumpia", 1)?;

    let slot = timeslot::VALID_TIMESLOTS.first().copied();
    match coordinator.checkout_session(slot, Some("demo-user")).await {
        Ok(order) => {
            tracing::info!(
                order_number = order.order_number,
                total_cost = order.total_cost,
                timeslot = %order.timeslot,
                "Order placed"
            );
            for notification in store.notifications_for_user("demo-user")? {
                tracing::info!(title = %notification.title, message = %notification.message, "Notification");
            }
        }
        Err(e) => {
            tracing::error!(code = %e.code(), error = %e, "Checkout failed");
        }
    }

    Ok(())
}

fn seed_catalog(store: &DocumentStore) -> anyhow::Result<()> {
    let items = [
        ("adobo", "Chicken Adobo", 45.0, 20),
        ("lumpia", "Lumpia Shanghai", 30.0, 15),
        ("sinigang", "Pork Sinigang", 55.0, 10),
    ];
    for (id, name, price, stock) in items {
        store.insert_menu_item(&MenuItem {
            id: id.into(),
            name: name.into(),
            description: None,
            price,
            stock,
        })?;
    }
    tracing::info!(count = items.len(), "Seeded demo catalog");
    Ok(())
}
