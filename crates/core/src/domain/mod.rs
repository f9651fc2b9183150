pub mod chat;
pub mod order;
pub mod product;
pub mod profile;
pub mod recommendation;
