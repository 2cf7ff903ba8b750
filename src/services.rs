pub mod allocation;
pub mod customer_service;
pub mod payment_service;
pub mod sale_service;

pub use customer_service::CustomerService;
pub use payment_service::PaymentService;
pub use sale_service::SaleService;
