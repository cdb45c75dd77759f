//! Authentication and authorization: sessions, principals, password
//! hashing, policies and login listeners.

pub mod listener;
pub mod password;
pub mod policy;
pub mod principal;
pub mod session;
