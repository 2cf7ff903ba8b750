// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Printing,
    Materials,
    Banner,
}

// --- Structs ---

// O núcleo do ledger só CONSOME produtos (consulta de preço na criação de
// venda); o cadastro do catálogo vive fora deste crate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub base_price: Decimal,
    pub category: ProductCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductSize {
    pub id: Uuid,
    pub product_id: Uuid,

    // Ex: "A4", "2x4ft"
    pub size: String,

    // Preço específico do tamanho; sobrepõe o base_price do produto
    pub price: Decimal,
}
