// src/services/sale_service.rs

use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{LedgerRepository, ProductRepository},
    models::sale::{CreateSalePayload, SaleItem, SaleStatus, SaleWithItems},
    services::allocation::{self, OutstandingSale},
};

// Item com o preço já resolvido (snapshot)
struct PricedItem {
    product_id: Uuid,
    size_id: Option<Uuid>,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
}

#[derive(Clone)]
pub struct SaleService {
    repo: LedgerRepository,
    product_repo: ProductRepository,
    lock_timeout: Duration,
}

impl SaleService {
    pub fn new(
        repo: LedgerRepository,
        product_repo: ProductRepository,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            product_repo,
            lock_timeout,
        }
    }

    /// Cria uma venda, calculando o total a partir dos itens, e aplica na
    /// hora o pagamento de entrada mais o crédito existente do cliente,
    /// pelo MESMO algoritmo de alocação do serviço de pagamentos, com a
    /// venda nova na frente da fila. O que transbordar da venda nova quita
    /// as vendas antigas em aberto (FIFO); o que sobrar de tudo vira
    /// crédito. Tudo em uma transação com a linha do cliente travada.
    pub async fn create_sale(&self, input: CreateSalePayload) -> Result<SaleWithItems, AppError> {
        input.validate()?;

        let upfront_payment = input.upfront_payment;
        if upfront_payment < Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "o pagamento de entrada não pode ser negativo: {upfront_payment}"
            )));
        }
        if upfront_payment > Decimal::ZERO && input.payment_type.is_none() {
            return Err(AppError::MissingPaymentType);
        }

        let mut tx = self.repo.pool().begin().await?;
        self.repo.set_lock_timeout(&mut *tx, self.lock_timeout).await?;

        // 1. Resolve os preços (snapshot) e calcula o total da venda
        let (priced_items, total_amount) = self.price_items(&mut tx, &input).await?;

        // 2. Trava o cliente: daqui até o commit, nenhuma outra alocação
        // mexe nos saldos dele
        let customer = self
            .repo
            .get_customer_for_update(&mut *tx, input.customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let existing_unpaid = self.repo.list_unpaid_sales(&mut *tx, customer.id).await?;

        // 3. Aloca: a venda nova é a primeira da fila (a entrada é dela),
        // seguida das antigas em aberto. A dívida de referência já inclui o
        // total da venda nova.
        let sale_id = Uuid::new_v4();
        let mut outstanding = vec![OutstandingSale {
            sale_id,
            remaining_balance: total_amount,
        }];
        outstanding.extend(existing_unpaid.iter().map(|s| OutstandingSale {
            sale_id: s.id,
            remaining_balance: s.remaining_balance(),
        }));

        let outcome = allocation::allocate(
            upfront_payment,
            customer.credit_balance,
            customer.total_debt + total_amount,
            &outstanding,
        )?;

        // 4. Campos iniciais da venda nova a partir da alocação dela
        let applied_to_sale = outcome
            .allocations
            .iter()
            .find(|a| a.sale_id == sale_id)
            .map(|a| a.amount_applied)
            .unwrap_or(Decimal::ZERO);

        // Parte tirada do crédito pré-existente (auditoria; o dinheiro é
        // atribuído primeiro)
        let credit_applied = (applied_to_sale - upfront_payment).max(Decimal::ZERO);
        let status = SaleStatus::from_amounts(applied_to_sale, total_amount);

        let sale = self
            .repo
            .insert_sale(
                &mut *tx,
                sale_id,
                customer.id,
                total_amount,
                applied_to_sale,
                credit_applied,
                input.payment_type,
                status,
            )
            .await?;

        let mut items: Vec<SaleItem> = Vec::with_capacity(priced_items.len());
        for item in &priced_items {
            let row = self
                .repo
                .insert_sale_item(
                    &mut *tx,
                    sale.id,
                    item.product_id,
                    item.size_id,
                    item.quantity,
                    item.unit_price,
                    item.total,
                )
                .await?;
            items.push(row);
        }

        // 5. Vendas antigas que receberam o transbordo da entrada
        for alloc in &outcome.allocations {
            if alloc.sale_id == sale.id {
                continue;
            }
            let old = existing_unpaid
                .iter()
                .find(|s| s.id == alloc.sale_id)
                .ok_or_else(|| {
                    anyhow::anyhow!("alocação referencia venda fora da sequência de entrada")
                })?;

            let new_amount_paid = old.amount_paid + alloc.amount_applied;
            let new_status = SaleStatus::from_amounts(new_amount_paid, old.total_amount);
            self.repo
                .apply_sale_payment(&mut *tx, old.id, new_amount_paid, new_status)
                .await?;
        }

        // 6. Houve dinheiro novo? Registro formal de pagamento + vínculos de
        // auditoria para as partes financiadas por ele (a parte de crédito
        // fica auditada em credit_applied e não gera vínculo).
        if upfront_payment > Decimal::ZERO {
            let payment_type = input
                .payment_type
                .ok_or(AppError::MissingPaymentType)?;
            let payment = self
                .repo
                .create_payment(&mut *tx, customer.id, upfront_payment, payment_type)
                .await?;

            let links = allocation::cash_link_amounts(upfront_payment, &outcome.allocations);
            for link in &links {
                self.repo
                    .create_sale_payment_link(&mut *tx, link.sale_id, payment.id, link.amount_applied)
                    .await?;
            }
        }

        // 7. Novos saldos globais
        self.repo
            .update_customer_balances(&mut *tx, customer.id, outcome.credit_balance, outcome.total_debt)
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            customer_id = %customer.id,
            total = %total_amount,
            paid = %applied_to_sale,
            "venda criada"
        );

        Ok(SaleWithItems { sale, items })
    }

    /// Resolve o preço unitário de cada item: preço do tamanho quando
    /// informado, senão o preço base do produto. Falha com NotFound se
    /// qualquer produto ou tamanho não existir.
    async fn price_items(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateSalePayload,
    ) -> Result<(Vec<PricedItem>, Decimal), AppError> {
        let product_ids: Vec<Uuid> = input.items.iter().map(|i| i.product_id).collect();
        let products = self.product_repo.find_by_ids(&mut **tx, &product_ids).await?;

        let mut priced = Vec::with_capacity(input.items.len());
        let mut total_amount = Decimal::ZERO;

        for item in &input.items {
            let product = products
                .get(&item.product_id)
                .ok_or(AppError::ProductNotFound(item.product_id))?;

            let unit_price = match item.size_id {
                Some(size_id) => {
                    let size = self
                        .product_repo
                        .find_size(&mut **tx, size_id, product.id)
                        .await?
                        .ok_or(AppError::SizeNotFound {
                            product_id: product.id,
                            size_id,
                        })?;
                    size.price
                }
                None => product.base_price,
            };

            let total = Decimal::from(item.quantity) * unit_price;
            total_amount += total;

            priced.push(PricedItem {
                product_id: item.product_id,
                size_id: item.size_id,
                quantity: item.quantity,
                unit_price,
                total,
            });
        }

        Ok((priced, total_amount))
    }

    // --- Caminhos de leitura ---

    pub async fn get_all_sales(&self) -> Result<Vec<SaleWithItems>, AppError> {
        let sales = self.repo.get_all_sales(self.repo.pool()).await?;
        let sale_ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
        let mut items = self
            .repo
            .list_items_for_sales(self.repo.pool(), &sale_ids)
            .await?;

        let mut result: Vec<SaleWithItems> = sales
            .into_iter()
            .map(|sale| SaleWithItems {
                sale,
                items: Vec::new(),
            })
            .collect();

        for item in items.drain(..) {
            if let Some(entry) = result.iter_mut().find(|s| s.sale.id == item.sale_id) {
                entry.items.push(item);
            }
        }

        Ok(result)
    }

    pub async fn get_sale_by_id(&self, sale_id: Uuid) -> Result<SaleWithItems, AppError> {
        let sale = self
            .repo
            .get_sale_by_id(self.repo.pool(), sale_id)
            .await?
            .ok_or(AppError::SaleNotFound)?;
        let items = self.repo.list_sale_items(self.repo.pool(), sale_id).await?;

        Ok(SaleWithItems { sale, items })
    }
}
