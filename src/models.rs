pub mod customer;
pub mod payment;
pub mod product;
pub mod sale;

pub use customer::{CreateCustomerPayload, Customer, UpdateCustomerPayload};
pub use payment::{Payment, PaymentPayload, PaymentType, SalePaymentLink};
pub use product::{Product, ProductCategory, ProductSize};
pub use sale::{CreateSalePayload, Sale, SaleItem, SaleItemPayload, SaleStatus, SaleWithItems};
