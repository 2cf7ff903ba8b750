// src/config.rs

use std::{env, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{CustomerRepository, LedgerRepository, ProductRepository},
    services::{CustomerService, PaymentService, SaleService},
};

// Prazo padrão de espera pelo lock da linha do cliente
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub customer_service: CustomerService,
    pub sale_service: SaleService,
    pub payment_service: PaymentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;

        // Espera limitada pelo lock do cliente; estourado o prazo, a operação
        // falha com erro "ocupado" em vez de travar em silêncio
        let lock_timeout = match env::var("LEDGER_LOCK_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(raw.parse()?),
            Err(_) => Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        };

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, lock_timeout))
    }

    /// Monta o gráfico de dependências sobre uma pool já criada
    /// (útil nos testes de integração).
    pub fn with_pool(db_pool: PgPool, lock_timeout: Duration) -> Self {
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let ledger_repo = LedgerRepository::new(db_pool.clone());

        let customer_service = CustomerService::new(customer_repo);
        let sale_service = SaleService::new(ledger_repo.clone(), product_repo, lock_timeout);
        let payment_service = PaymentService::new(ledger_repo, lock_timeout);

        Self {
            db_pool,
            customer_service,
            sale_service,
            payment_service,
        }
    }

    /// Roda as migrações embutidas do SQLx.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!().run(&self.db_pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
        Ok(())
    }
}
