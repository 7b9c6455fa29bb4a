//! Aggregates module
pub mod address;
pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use address::{Address, AddressFields, AddressType};
pub use cart::{Cart, CartContents, CartItem, CartLine};
pub use category::{Category, CategoryFilter, CategoryNode, CategoryTree, MAX_DEPTH};
pub use order::{Order, OrderItem, OrderStatus};
pub use product::{Product, ProductDraft};
pub use user::{Registration, User, UserProfile};
