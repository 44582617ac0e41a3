pub mod password;

pub use password::{digest_password, verify_password, PasswordDigest};
