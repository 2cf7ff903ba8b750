// src/models/sale.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::payment::PaymentType;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sale_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Unpaid,
    PartiallyPaid,
    FullyPaid,
}

impl SaleStatus {
    /// Deriva o status a partir dos valores, sempre da mesma forma.
    /// A máquina de estados é monotônica: amount_paid só cresce, e
    /// FullyPaid é terminal (não há estorno).
    pub fn from_amounts(amount_paid: Decimal, total_amount: Decimal) -> Self {
        if amount_paid >= total_amount {
            SaleStatus::FullyPaid
        } else if amount_paid > Decimal::ZERO {
            SaleStatus::PartiallyPaid
        } else {
            SaleStatus::Unpaid
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub customer_id: Uuid,

    // Calculado na criação a partir dos itens; imutável depois
    pub total_amount: Decimal,

    // Invariante: 0 <= amount_paid <= total_amount
    pub amount_paid: Decimal,

    // Crédito pré-existente consumido por esta venda na criação (auditoria)
    pub credit_applied: Decimal,

    // Tipo do pagamento de entrada, quando houve
    pub payment_type: Option<PaymentType>,

    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Quanto ainda falta pagar desta venda.
    pub fn remaining_balance(&self) -> Decimal {
        self.total_amount - self.amount_paid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub size_id: Option<Uuid>,
    pub quantity: i32,

    // Snapshot do preço no momento da venda
    pub unit_price: Decimal,

    // quantity * unit_price
    pub total: Decimal,
}

// Venda com seus itens, como devolvida ao chamador
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// --- Payloads de entrada ---

#[derive(Debug, Deserialize, Validate)]
pub struct SaleItemPayload {
    pub product_id: Uuid,
    pub size_id: Option<Uuid>,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
}

// Dados para criação de uma venda. upfront_payment é o dinheiro NOVO
// entregue agora; o sinal é checado no serviço (Decimal não passa pelo
// derive do validator).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalePayload {
    pub customer_id: Uuid,

    #[serde(default)]
    pub upfront_payment: Decimal,

    pub payment_type: Option<PaymentType>,

    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<SaleItemPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_is_derived_from_amounts() {
        assert_eq!(
            SaleStatus::from_amounts(dec!(0), dec!(100)),
            SaleStatus::Unpaid
        );
        assert_eq!(
            SaleStatus::from_amounts(dec!(40), dec!(100)),
            SaleStatus::PartiallyPaid
        );
        assert_eq!(
            SaleStatus::from_amounts(dec!(100), dec!(100)),
            SaleStatus::FullyPaid
        );
    }

    #[test]
    fn zero_total_sale_is_fully_paid() {
        // Venda sem itens: total 0, nada a pagar
        assert_eq!(
            SaleStatus::from_amounts(dec!(0), dec!(0)),
            SaleStatus::FullyPaid
        );
    }
}
