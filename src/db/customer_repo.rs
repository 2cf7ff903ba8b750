// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::customer::Customer};

// Repositório de clientes: cadastro e leitura.
// Os saldos (credit_balance / total_debt) NÃO são escritos por aqui; eles só
// mudam pelo LedgerRepository, dentro da transação travada dos serviços de
// alocação.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_customer<'e, E>(&self, executor: E, name: &str) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name)
            VALUES ($1)
            RETURNING id, name, credit_balance, total_debt, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }

    pub async fn get_all_customers<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;

        Ok(customers)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    pub async fn update_name<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        name: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, credit_balance, total_debt, created_at, updated_at
            "#,
        )
        .bind(customer_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }
}
