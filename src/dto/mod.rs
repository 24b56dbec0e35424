pub mod cart;
pub mod customers;
pub mod discounts;
pub mod orders;
