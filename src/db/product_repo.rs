// src/db/product_repo.rs

use std::collections::HashMap;

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::product::{Product, ProductSize},
};

// O ledger só precisa resolver preços; o cadastro do catálogo fica fora.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Busca vários produtos de uma vez e devolve um mapa por id,
    /// para validar todos os itens de uma venda numa única query.
    pub async fn find_by_ids<'e, E>(
        &self,
        executor: E,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1)",
        )
        .bind(product_ids)
        .fetch_all(executor)
        .await?;

        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Busca o preço específico de um tamanho, garantindo que ele pertence
    /// ao produto informado.
    pub async fn find_size<'e, E>(
        &self,
        executor: E,
        size_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<ProductSize>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let size = sqlx::query_as::<_, ProductSize>(
            "SELECT * FROM product_sizes WHERE id = $1 AND product_id = $2",
        )
        .bind(size_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await?;

        Ok(size)
    }
}
