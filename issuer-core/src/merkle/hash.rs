use std::fmt;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};

use rst_common::standard::serde::{self, Deserialize, Serialize};

use super::types::MerkleError;

pub const HASH_BYTES: usize = 32;

/// Bytes packed into a single field element by [`hash_bytes`], small enough to
/// always stay below the BN254 modulus
const BYTES_PER_ELEMENT: usize = 31;

/// `Hash` is a BN254 scalar field element stored as 32 little endian bytes
///
/// Every key, value and node hash of the merkle trees uses this representation,
/// including the path bits, which are read from the little endian form
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde", try_from = "String", into = "String")]
pub struct Hash([u8; HASH_BYTES]);

impl Hash {
    pub const fn zero() -> Self {
        Self([0u8; HASH_BYTES])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; HASH_BYTES];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// `from_le_bytes` rejects any value outside of the field
    pub fn from_le_bytes(bytes: [u8; HASH_BYTES]) -> Result<Self, MerkleError> {
        let hash = Self(bytes);
        if !hash.is_valid_field_element() {
            return Err(MerkleError::InvalidFieldElement(hash.to_hex()));
        }

        Ok(hash)
    }

    pub fn from_hex(value: &str) -> Result<Self, MerkleError> {
        let value = value.strip_prefix("0x").unwrap_or(value);

        let mut bytes = [0u8; HASH_BYTES];
        hex::decode_to_slice(value, &mut bytes)
            .map_err(|err| MerkleError::InvalidFieldElement(err.to_string()))?;

        Self::from_le_bytes(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `to_be_hex` renders the field element the way circom and the chain verifiers print it
    pub fn to_be_hex(&self) -> String {
        let mut be = self.0;
        be.reverse();
        hex::encode(be)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_BYTES] {
        &self.0
    }

    /// `path_bit` selects the child taken at the given depth, `true` means right
    pub fn path_bit(&self, level: usize) -> bool {
        (self.0[level / 8] >> (level % 8)) & 1 == 1
    }

    pub fn is_valid_field_element(&self) -> bool {
        Self::from_fr(self.to_fr()) == *self
    }

    pub(crate) fn to_fr(self) -> Fr {
        Fr::from_le_bytes_mod_order(&self.0)
    }

    pub(crate) fn from_fr(value: Fr) -> Self {
        let mut bytes = [0u8; HASH_BYTES];
        let le = value.into_bigint().to_bytes_le();
        let len = le.len().min(HASH_BYTES);
        bytes[..len].copy_from_slice(&le[..len]);
        Self(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl From<Hash> for String {
    fn from(value: Hash) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for Hash {
    type Error = MerkleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Hash::from_hex(&value)
    }
}

/// `hash_elems` is the circom compatible Poseidon hash over the given elements
pub fn hash_elems(elems: &[Hash]) -> Result<Hash, MerkleError> {
    let mut poseidon = Poseidon::<Fr>::new_circom(elems.len())
        .map_err(|err| MerkleError::HashError(err.to_string()))?;

    let inputs: Vec<Fr> = elems.iter().map(|elem| elem.to_fr()).collect();
    let output = poseidon
        .hash(&inputs)
        .map_err(|err| MerkleError::HashError(err.to_string()))?;

    Ok(Hash::from_fr(output))
}

pub fn hash_leaf(key: &Hash, value: &Hash) -> Result<Hash, MerkleError> {
    hash_elems(&[*key, *value, Hash::from_u64(1)])
}

pub fn hash_middle(left: &Hash, right: &Hash) -> Result<Hash, MerkleError> {
    hash_elems(&[*left, *right])
}

/// `hash_bytes` maps arbitrary bytes into a single field element
///
/// The input is split into 31 bytes chunks, each chunk is a field element, and
/// the chunks are folded with [`hash_middle`] starting from the input length.
pub fn hash_bytes(data: &[u8]) -> Result<Hash, MerkleError> {
    let mut acc = Hash::from_u64(data.len() as u64);
    for chunk in data.chunks(BYTES_PER_ELEMENT) {
        let mut bytes = [0u8; HASH_BYTES];
        bytes[..chunk.len()].copy_from_slice(chunk);
        acc = hash_middle(&acc, &Hash(bytes))?;
    }

    Ok(acc)
}
