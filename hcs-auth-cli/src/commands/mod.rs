pub mod fingerprint;
pub mod issue;
pub mod listen;
pub mod verify;
