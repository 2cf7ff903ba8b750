// src/services/customer_service.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::{CreateCustomerPayload, Customer, UpdateCustomerPayload},
};

// Cadastro e leitura de clientes. Não há exclusão (clientes com histórico de
// vendas/pagamentos nunca somem do ledger), e os saldos não são editáveis por
// aqui: só os serviços de alocação mexem neles.
#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository) -> Self {
        Self { repo }
    }

    pub async fn create_customer(&self, input: CreateCustomerPayload) -> Result<Customer, AppError> {
        input.validate()?;
        self.repo.create_customer(self.repo.pool(), &input.name).await
    }

    pub async fn get_all_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.repo.get_all_customers(self.repo.pool()).await
    }

    pub async fn get_customer_by_id(&self, customer_id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find_by_id(self.repo.pool(), customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerPayload,
    ) -> Result<Customer, AppError> {
        input.validate()?;
        self.repo
            .update_name(self.repo.pool(), customer_id, &input.name)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }
}
