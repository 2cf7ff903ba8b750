pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod ledger_repo;
pub use ledger_repo::LedgerRepository;
