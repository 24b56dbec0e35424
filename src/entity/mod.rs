pub mod canceled_orders;
pub mod customers;
pub mod modified_orders;
pub mod orders;

pub use canceled_orders::Entity as CanceledOrders;
pub use customers::Entity as Customers;
pub use modified_orders::Entity as ModifiedOrders;
pub use orders::Entity as Orders;
