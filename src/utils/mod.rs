pub mod jwt;
pub mod money;
pub mod password;
pub mod tokens;
