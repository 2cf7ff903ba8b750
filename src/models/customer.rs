// src/models/customer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// Representa um cliente vindo do banco de dados.
//
// Os saldos globais (credit_balance / total_debt) são mutados SOMENTE dentro
// de uma transação com a linha do cliente travada, pelos serviços de
// alocação. Nenhum repositório expõe setter direto para eles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,

    // Dinheiro que o cliente pagou a mais (pré-pago), nunca negativo
    pub credit_balance: Decimal,

    // Soma dos saldos em aberto das vendas, nunca negativo.
    // Invariante: em estado assentado, no máximo um dos dois saldos é positivo.
    pub total_debt: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para cadastro de um novo cliente
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "O nome do cliente não pode ser vazio."))]
    pub name: String,
}

// Dados para atualização de um cliente (apenas o nome é editável)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, message = "O nome do cliente não pode ser vazio."))]
    pub name: String,
}
