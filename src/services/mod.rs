pub mod auth_service;
pub mod etag;
pub mod label_codec;
pub mod validation;
