// src/services/payment_service.rs

use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LedgerRepository,
    models::payment::{Payment, PaymentPayload},
    models::sale::SaleStatus,
    services::allocation::{self, OutstandingSale},
};

#[derive(Clone)]
pub struct PaymentService {
    repo: LedgerRepository,
    lock_timeout: Duration,
}

impl PaymentService {
    pub fn new(repo: LedgerRepository, lock_timeout: Duration) -> Self {
        Self { repo, lock_timeout }
    }

    /// Registra um pagamento e o distribui pelas vendas em aberto do cliente,
    /// da mais antiga para a mais nova, tudo dentro de UMA transação com a
    /// linha do cliente travada. Ou tudo entra, ou nada entra: nenhuma
    /// alocação parcial fica visível.
    pub async fn apply_payment(&self, input: PaymentPayload) -> Result<Payment, AppError> {
        // Rejeitado antes de qualquer lock
        if input.amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "o valor do pagamento deve ser positivo: {}",
                input.amount
            )));
        }

        let mut tx = self.repo.pool().begin().await?;

        // Espera limitada pelo lock: estourou, vira ConcurrencyConflict e o
        // chamador decide se reenvia.
        self.repo.set_lock_timeout(&mut *tx, self.lock_timeout).await?;

        let customer = self
            .repo
            .get_customer_for_update(&mut *tx, input.customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        // Vendas em aberto, FIFO
        let unpaid_sales = self.repo.list_unpaid_sales(&mut *tx, customer.id).await?;

        // O pagamento é criado primeiro para já ter id na hora dos vínculos
        let payment = self
            .repo
            .create_payment(&mut *tx, customer.id, input.amount, input.payment_type)
            .await?;

        let outstanding: Vec<OutstandingSale> = unpaid_sales
            .iter()
            .map(|s| OutstandingSale {
                sale_id: s.id,
                remaining_balance: s.remaining_balance(),
            })
            .collect();

        let outcome = allocation::allocate(
            input.amount,
            customer.credit_balance,
            customer.total_debt,
            &outstanding,
        )?;

        // Atualiza cada venda que recebeu fundos
        for alloc in &outcome.allocations {
            let sale = unpaid_sales
                .iter()
                .find(|s| s.id == alloc.sale_id)
                .ok_or_else(|| {
                    anyhow::anyhow!("alocação referencia venda fora da sequência de entrada")
                })?;

            let new_amount_paid = sale.amount_paid + alloc.amount_applied;
            let new_status = SaleStatus::from_amounts(new_amount_paid, sale.total_amount);
            self.repo
                .apply_sale_payment(&mut *tx, sale.id, new_amount_paid, new_status)
                .await?;
        }

        // Vínculos de auditoria: só a parte financiada pelo dinheiro deste
        // pagamento, de modo que soma(vínculos) <= payment.amount sempre.
        // (Em estado assentado crédito e dívida não coexistem, então aqui os
        // vínculos normalmente cobrem o valor aplicado inteiro.)
        let links = allocation::cash_link_amounts(input.amount, &outcome.allocations);
        for link in &links {
            self.repo
                .create_sale_payment_link(&mut *tx, link.sale_id, payment.id, link.amount_applied)
                .await?;
        }

        self.repo
            .update_customer_balances(&mut *tx, customer.id, outcome.credit_balance, outcome.total_debt)
            .await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            customer_id = %customer.id,
            amount = %payment.amount,
            allocated = %outcome.total_allocated,
            "pagamento aplicado"
        );

        Ok(payment)
    }

    // --- Caminhos de leitura (visão única da empresa, sem partição por usuário) ---

    pub async fn get_all_payments(&self) -> Result<Vec<Payment>, AppError> {
        self.repo.get_all_payments(self.repo.pool()).await
    }

    pub async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Payment, AppError> {
        self.repo
            .get_payment_by_id(self.repo.pool(), payment_id)
            .await?
            .ok_or(AppError::PaymentNotFound)
    }

    pub async fn get_customer_payment_history(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Payment>, AppError> {
        // Garante que o cliente existe antes de devolver lista (pode ser vazia)
        if !self
            .repo
            .customer_exists(self.repo.pool(), customer_id)
            .await?
        {
            return Err(AppError::CustomerNotFound);
        }

        self.repo
            .list_customer_payments(self.repo.pool(), customer_id)
            .await
    }
}
