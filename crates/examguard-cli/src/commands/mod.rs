pub mod analyze;
pub mod compare;
pub mod init;
pub mod score;
pub mod validate;
