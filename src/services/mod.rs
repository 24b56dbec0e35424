pub mod checkout_service;
pub mod customer_service;
pub mod discount_service;
pub mod order_mutation_service;
pub mod order_service;
