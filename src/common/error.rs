// src/common/error.rs

use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// A camada HTTP (fora deste crate) decide o status code de cada variante.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Valor monetário inválido: {0}")]
    InvalidAmount(String),

    #[error("Tipo de pagamento é obrigatório quando há pagamento de entrada")]
    MissingPaymentType,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Produto {0} não encontrado")]
    ProductNotFound(Uuid),

    #[error("Tamanho {size_id} do produto {product_id} não encontrado")]
    SizeNotFound { product_id: Uuid, size_id: Uuid },

    #[error("Venda não encontrada")]
    SaleNotFound,

    #[error("Pagamento não encontrado")]
    PaymentNotFound,

    // Lock não adquirido dentro do prazo, ou violação de chave única em um
    // vínculo de auditoria. O chamador pode reenviar a requisição; nós nunca
    // repetimos automaticamente.
    #[error("Registro em uso por outra operação; tente novamente")]
    ConcurrencyConflict,

    // Qualquer outra falha do banco. A transação inteira já foi desfeita.
    #[error("Erro de banco de dados")]
    DatabaseError(sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// O chamador pode reenviar a mesma requisição com chance de sucesso?
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ConcurrencyConflict)
    }
}

// SQLSTATE 55P03 = lock_not_available (estourou o lock_timeout da transação)
const LOCK_NOT_AVAILABLE: &str = "55P03";

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::ConcurrencyConflict;
            }
            if db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
                return AppError::ConcurrencyConflict;
            }
        }
        AppError::DatabaseError(e)
    }
}
