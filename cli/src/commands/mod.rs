pub mod analyse;
pub mod info;
