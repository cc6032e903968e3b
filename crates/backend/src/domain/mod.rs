pub mod a001_warehouse;
pub mod a002_client;
pub mod a003_product;
pub mod a004_stock;
pub mod a005_employee;
pub mod a006_load;
