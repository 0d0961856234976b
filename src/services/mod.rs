pub mod intake;
pub mod provisioning;
pub mod staging;
pub mod storage;
pub mod upload_service;
pub mod worker;
