// src/db/ledger_repo.rs

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::Customer,
    models::payment::{Payment, PaymentType, SalePaymentLink},
    models::sale::{Sale, SaleItem, SaleStatus},
};

// Repositório do ledger: tudo que a transação travada de alocação toca
// (cliente com FOR UPDATE, vendas em aberto, pagamentos, vínculos de
// auditoria e saldos), mais os caminhos de leitura de vendas e pagamentos.
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  DISCIPLINA DE TRAVAMENTO
    // =========================================================================

    /// Limita a espera por locks dentro da transação corrente.
    /// Estourado o prazo, o Postgres devolve SQLSTATE 55P03, que vira
    /// AppError::ConcurrencyConflict (erro "ocupado", reenviável).
    pub async fn set_lock_timeout<'e, E>(
        &self,
        executor: E,
        timeout: Duration,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // SET LOCAL não aceita bind de parâmetro; o valor vem da nossa
        // configuração, nunca de entrada do usuário.
        let stmt = format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis());
        sqlx::query(&stmt).execute(executor).await?;
        Ok(())
    }

    /// Carrega o cliente com lock de escrita (FOR UPDATE). Este lock é o
    /// único ponto de serialização: duas alocações concorrentes para o MESMO
    /// cliente ficam totalmente ordenadas; clientes diferentes seguem em
    /// paralelo. O lock precisa valer da primeira leitura dos saldos até o
    /// commit, senão dois leitores calculariam alocações sobre saldos velhos.
    pub async fn get_customer_for_update<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 FOR UPDATE",
        )
        .bind(customer_id)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    /// Existência do cliente, sem lock (para os caminhos de leitura).
    pub async fn customer_exists<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)",
        )
        .bind(customer_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Vendas em aberto do cliente, da mais antiga para a mais nova.
    /// A ordem FIFO é contrato do algoritmo de alocação, não detalhe.
    pub async fn list_unpaid_sales<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE customer_id = $1 AND status <> 'fully_paid'
            ORDER BY created_at ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(sales)
    }

    /// Grava os novos saldos calculados pela alocação.
    pub async fn update_customer_balances<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        credit_balance: Decimal,
        total_debt: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE customers
            SET credit_balance = $2, total_debt = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(customer_id)
        .bind(credit_balance)
        .bind(total_debt)
        .execute(executor)
        .await?;

        Ok(())
    }

    // =========================================================================
    //  PAGAMENTOS E VÍNCULOS
    // =========================================================================

    pub async fn create_payment<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        amount: Decimal,
        payment_type: PaymentType,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (customer_id, amount, payment_type)
            VALUES ($1, $2, $3)
            RETURNING id, customer_id, amount, payment_type, created_at
            "#,
        )
        .bind(customer_id)
        .bind(amount)
        .bind(payment_type)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    /// Insere um vínculo de auditoria pagamento -> venda.
    /// Violação da chave (sale_id, payment_id) vira ConcurrencyConflict.
    pub async fn create_sale_payment_link<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        payment_id: Uuid,
        amount_applied: Decimal,
    ) -> Result<SalePaymentLink, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let link = sqlx::query_as::<_, SalePaymentLink>(
            r#"
            INSERT INTO sale_payment_links (sale_id, payment_id, amount_applied)
            VALUES ($1, $2, $3)
            RETURNING sale_id, payment_id, amount_applied, created_at
            "#,
        )
        .bind(sale_id)
        .bind(payment_id)
        .bind(amount_applied)
        .fetch_one(executor)
        .await?;

        Ok(link)
    }

    pub async fn get_payment_by_id<'e, E>(
        &self,
        executor: E,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(executor)
            .await?;

        Ok(payment)
    }

    pub async fn get_all_payments<'e, E>(&self, executor: E) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY created_at DESC")
                .fetch_all(executor)
                .await?;

        Ok(payments)
    }

    pub async fn list_customer_payments<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(payments)
    }

    pub async fn list_sale_links<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
    ) -> Result<Vec<SalePaymentLink>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let links = sqlx::query_as::<_, SalePaymentLink>(
            "SELECT * FROM sale_payment_links WHERE sale_id = $1 ORDER BY created_at ASC",
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;

        Ok(links)
    }

    // =========================================================================
    //  VENDAS
    // =========================================================================

    /// O id vem do serviço (gerado antes da alocação, que precisa referenciar
    /// a venda nova junto com as antigas).
    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        customer_id: Uuid,
        total_amount: Decimal,
        amount_paid: Decimal,
        credit_applied: Decimal,
        payment_type: Option<PaymentType>,
        status: SaleStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (id, customer_id, total_amount, amount_paid, credit_applied, payment_type, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, customer_id, total_amount, amount_paid, credit_applied, payment_type, status, created_at
            "#,
        )
        .bind(sale_id)
        .bind(customer_id)
        .bind(total_amount)
        .bind(amount_paid)
        .bind(credit_applied)
        .bind(payment_type)
        .bind(status)
        .fetch_one(executor)
        .await?;

        Ok(sale)
    }

    pub async fn insert_sale_item<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        product_id: Uuid,
        size_id: Option<Uuid>,
        quantity: i32,
        unit_price: Decimal,
        total: Decimal,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (sale_id, product_id, size_id, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sale_id, product_id, size_id, quantity, unit_price, total
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(size_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(total)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    /// Aplica um valor alocado em uma venda: incrementa amount_paid e grava
    /// o status derivado. amount_paid só cresce; nunca há decremento.
    pub async fn apply_sale_payment<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        new_amount_paid: Decimal,
        new_status: SaleStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE sales SET amount_paid = $2, status = $3 WHERE id = $1")
            .bind(sale_id)
            .bind(new_amount_paid)
            .bind(new_status)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn get_sale_by_id<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(sale_id)
            .fetch_optional(executor)
            .await?;

        Ok(sale)
    }

    pub async fn get_all_sales<'e, E>(&self, executor: E) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sales = sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;

        Ok(sales)
    }

    pub async fn list_sale_items<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
    ) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = $1")
            .bind(sale_id)
            .fetch_all(executor)
            .await?;

        Ok(items)
    }

    /// Itens de várias vendas numa única query (para listagens).
    pub async fn list_items_for_sales<'e, E>(
        &self,
        executor: E,
        sale_ids: &[Uuid],
    ) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = ANY($1)",
        )
        .bind(sale_ids)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }
}
