// src/models/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Transfer,
    Cash,
    Card,
}

// --- Structs ---

// Registro imutável de dinheiro recebido. Representa a ORIGEM dos fundos;
// a alocação em vendas é registrada à parte, em SalePaymentLink.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub created_at: DateTime<Utc>,
}

// Trilha de auditoria: quanto de um pagamento foi aplicado em uma venda.
// Um pagamento pode gerar vários vínculos (repartido entre vendas) e uma
// venda pode receber vínculos de vários pagamentos. Registros são
// append-only: nunca atualizados nem removidos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalePaymentLink {
    pub sale_id: Uuid,
    pub payment_id: Uuid,
    pub amount_applied: Decimal,
    pub created_at: DateTime<Utc>,
}

// Dados para registrar um pagamento avulso.
// O valor é Decimal, então o sinal é checado no serviço (antes de qualquer
// lock), não pelo derive do validator.
#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub payment_type: PaymentType,
}
