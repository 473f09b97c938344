use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

macro_rules! fixed_buf {
    ($name:ident, $len:expr) => {
        #[derive(
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Arbitrary,
            BorshSerialize,
            BorshDeserialize,
            Serialize,
            Deserialize,
        )]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;
            pub const ZERO: Self = Self([0u8; $len]);

            pub const fn new(buf: [u8; $len]) -> Self {
                Self(buf)
            }

            pub fn as_slice(&self) -> &[u8] {
                &self.0
            }

            pub fn into_inner(self) -> [u8; $len] {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }

            /// Length of the common most-significant-bit prefix shared with `other`.
            pub fn matching_bits(&self, other: &Self) -> u32 {
                let mut bits = 0u32;
                for (a, b) in self.0.iter().zip(other.0.iter()) {
                    let x = a ^ b;
                    if x == 0 {
                        bits += 8;
                        continue;
                    }
                    bits += x.leading_zeros();
                    break;
                }
                bits
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(buf: [u8; $len]) -> Self {
                Self(buf)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                Ok(Self(value.try_into()?))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }
    };
}

fixed_buf!(Buf20, 20);
fixed_buf!(Buf32, 32);
fixed_buf!(Buf64, 64);

/// SHA-256 of `a ++ b`.
pub fn sha256_concat(parts: &[&[u8]]) -> Buf32 {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    Buf32::new(hasher.finalize().into())
}
