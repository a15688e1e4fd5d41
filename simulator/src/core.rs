use config::shared::PgConnectionConfig;
use handoff::catalog::request::ProductCreateRequest;
use handoff::catalog::response::CreateProductResponse;
use handoff::catalog::service::ProductService;
use handoff::concurrency::cancel::CallContext;
use handoff::rendezvous::session::RendezvousSession;
use handoff::rendezvous::types::{Branch, DEFAULT_FEATURE_BRANCH, PullRequest};
use handoff::runner::pool::WorkerPool;
use handoff::store::base::{CategoryStore, ProductStore, ProductTransaction};
use handoff::store::memory::MemoryStore;
use handoff::store::postgres::PostgresStore;
use handoff::transaction::TransactionSource;
use postgres::categories::upsert_category;
use postgres::db::connect_to_catalog_database;
use postgres::migrations::migrate_catalog;
use tracing::{info, warn};

use crate::config::SimulatorConfig;

/// Runs the rendezvous sessions and the product scenario described by `config`.
pub async fn start_simulator(config: SimulatorConfig) -> anyhow::Result<()> {
    run_rendezvous(&config).await?;

    let pool = WorkerPool::new(&config.runner);

    match &config.database {
        Some(database) => {
            let store = postgres_store(database, &config).await?;
            let service = ProductService::new(store, pool.clone(), &config.runner);
            run_products(&service, &config).await;
        }
        None => {
            let store = MemoryStore::with_categories(config.seed_categories.iter().cloned()).await;
            let service = ProductService::new(store, pool.clone(), &config.runner);
            run_products(&service, &config).await;
        }
    }

    pool.shutdown().await;
    pool.wait().await?;
    info!("simulator finished");

    Ok(())
}

async fn run_rendezvous(config: &SimulatorConfig) -> anyhow::Result<()> {
    let session = RendezvousSession::new(config.rendezvous.clone());
    let ctx = CallContext::background();

    for actor in &config.actors {
        let pull_request = PullRequest::new(actor.clone(), Branch::feature(DEFAULT_FEATURE_BRANCH));
        let report = session.run(&ctx, pull_request).await?;

        match report.merged() {
            Some(merge) => info!(actor = %actor, from = %merge.from, to = %merge.to, "merge confirmed"),
            None => warn!(actor = %actor, "pull request rejected"),
        }
    }

    Ok(())
}

async fn postgres_store(
    database: &PgConnectionConfig,
    config: &SimulatorConfig,
) -> anyhow::Result<PostgresStore> {
    let max_connections = u32::try_from(config.runner.pool_size().get()).unwrap_or(u32::MAX);
    let pool = connect_to_catalog_database(database, max_connections).await?;
    migrate_catalog(&pool).await?;

    for name in &config.seed_categories {
        upsert_category(&pool, name).await?;
    }

    Ok(PostgresStore::new(pool))
}

/// Creates one product per call shape, plus one for a category that does not exist.
async fn run_products<S>(service: &ProductService<S>, config: &SimulatorConfig)
where
    S: CategoryStore + ProductStore + TransactionSource + Clone + 'static,
    S::Tx: ProductTransaction,
{
    let Some(category) = config.seed_categories.first() else {
        warn!("no seed categories configured, skipping product creation");
        return;
    };

    let ctx = CallContext::background();
    let run_id = std::process::id();

    let results = [
        ("inline", service.create_product(&ctx, request(run_id, 1, category)).await),
        (
            "spawned",
            service
                .create_product_async(&ctx, request(run_id, 2, category))
                .recv(&ctx)
                .await,
        ),
        (
            "pooled",
            service
                .create_product_pooled(&ctx, request(run_id, 3, category))
                .await
                .recv(&ctx)
                .await,
        ),
        (
            "transactional",
            service.create_product_tx(&ctx, request(run_id, 4, category)).await,
        ),
        (
            "missing category",
            service
                .create_product(&ctx, request(run_id, 5, "__missing__"))
                .await,
        ),
    ];

    for (shape, result) in results {
        match result {
            Ok(product) => {
                let response = CreateProductResponse::from(&product);
                info!(
                    shape,
                    message = response.message,
                    product_id = %response.data.id,
                    "product created"
                );
            }
            Err(err) => warn!(shape, kind = ?err.kind(), error = %err, "product creation failed"),
        }
    }
}

fn request(run_id: u32, index: u32, category: &str) -> ProductCreateRequest {
    ProductCreateRequest {
        name: format!("Simulated product {index}"),
        sku: format!("SIM-{run_id}-{index}"),
        category: category.to_string(),
        image_url: format!("https://cdn.example.com/sim-{index}.png"),
        notes: "Created by the simulator".to_string(),
        price: 10.0 * f64::from(index),
        stock: 10,
        location: "Warehouse A".to_string(),
        is_available: true,
    }
}
