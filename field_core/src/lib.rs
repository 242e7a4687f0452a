//! Finite-field value type and the canonical sponge compression function.
//!
//! Every identifier, packed value, and hash in the mirror lives in the scalar
//! field of the remote program's proving curve. The compression function here
//! must reproduce the circuit's hash value-for-value; the round count,
//! constant derivation, and exponent are fixed and guarded by the golden
//! vectors in [`sponge`].

mod field;
pub mod sponge;

pub use field::{
    decode_signed, encode_signed, half_modulus, modulus, FieldElement, FieldError,
    MODULUS_DECIMAL,
};
pub use sponge::{compress, ROUNDS};
