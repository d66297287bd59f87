pub mod constituency;
pub mod county;
pub mod ward;

pub use constituency::Constituency;
pub use county::County;
pub use ward::Ward;
