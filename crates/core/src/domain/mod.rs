pub mod envelope;
pub mod faq;
pub mod order;
pub mod product;
pub mod query;
pub mod ticket;
