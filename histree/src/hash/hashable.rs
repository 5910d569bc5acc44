use std::{borrow::Cow, sync::Arc};

use super::Digest;

/// Types which can be hashed into a [`Digest`]
///
/// This is how salts are turned into digests before they are committed. Integers use the ledger's
/// 256-bit big-endian word encoding, so `4u64.hash()` matches the ledger's hash of the number 4.
/// Byte strings hash their raw bytes
///
/// ```rust
/// # use histree::hash::{Digest, Hashable};
/// let mut word = [0u8; 32];
/// word[31] = 4;
///
/// assert_eq!(4u64.hash(), Digest::calculate(&word));
/// assert_eq!("salt".hash(), Digest::calculate(b"salt"));
/// ```
pub trait Hashable {
    /// Compute the hash of this object
    fn hash(&self) -> Digest;
}

impl<T: ?Sized> Hashable for &T
where
    T: Hashable,
{
    fn hash(&self) -> Digest {
        <T as Hashable>::hash(self)
    }
}

impl<'a, T: ?Sized> Hashable for Cow<'a, T>
where
    T: Hashable + ToOwned,
{
    fn hash(&self) -> Digest {
        <T as Hashable>::hash(self)
    }
}

impl<T: ?Sized> Hashable for Arc<T>
where
    T: Hashable,
{
    fn hash(&self) -> Digest {
        <T as Hashable>::hash(self)
    }
}

impl Hashable for Digest {
    fn hash(&self) -> Digest {
        Digest::calculate(self.as_bytes())
    }
}

/// Encode an integer as a 32-byte big-endian word, sign-extending negative values
fn word(be_bytes: &[u8], negative: bool) -> [u8; 32] {
    let mut word = if negative { [0xff; 32] } else { [0; 32] };
    let offset = word.len() - be_bytes.len();
    word[offset..].copy_from_slice(be_bytes);
    word
}

macro_rules! uint_impl {
    ($int:ty) => {
        impl Hashable for $int {
            fn hash(&self) -> Digest {
                Digest::calculate(&word(&self.to_be_bytes(), false))
            }
        }
    };
}

macro_rules! int_impl {
    ($int:ty) => {
        impl Hashable for $int {
            fn hash(&self) -> Digest {
                Digest::calculate(&word(&self.to_be_bytes(), *self < 0))
            }
        }
    };
}

uint_impl!(u8);
uint_impl!(u16);
uint_impl!(u32);
uint_impl!(u64);
uint_impl!(u128);
uint_impl!(usize);

int_impl!(i8);
int_impl!(i16);
int_impl!(i32);
int_impl!(i64);
int_impl!(i128);
int_impl!(isize);

/// impl for any type that implements `AsRef<[u8]>`
macro_rules! as_ref_impl {
    ($t:ty) => {
        impl Hashable for $t {
            fn hash(&self) -> Digest {
                let bytes = <$t as AsRef<[u8]>>::as_ref(self);
                Digest::calculate(bytes)
            }
        }
    };
}

impl<const N: usize> Hashable for [u8; N] {
    fn hash(&self) -> Digest {
        Digest::calculate(self)
    }
}

// implemented on `[u8]` and `str` rather than their references, so the impls above cover
// `Arc<str>` and `Cow<[u8]>`
as_ref_impl!([u8]);
as_ref_impl!(Vec<u8>);
as_ref_impl!(str);
as_ref_impl!(String);

/// The digest a revealed value is committed under
///
/// Values are right-padded with zero bytes to a full 32-byte word before hashing (values already
/// at least a word long are hashed as they are). This is the digest a voter later proves
/// inclusion for
///
/// ```rust
/// # use histree::hash::{value_digest, Digest};
/// let mut padded = b"secret".to_vec();
/// padded.resize(32, 0);
///
/// assert_eq!(value_digest("secret"), Digest::calculate(&padded));
/// ```
#[must_use]
pub fn value_digest(value: impl AsRef<[u8]>) -> Digest {
    let value = value.as_ref();
    if value.len() >= Digest::LEN {
        return Digest::calculate(value);
    }

    let mut padded = [0u8; Digest::LEN];
    padded[..value.len()].copy_from_slice(value);
    Digest::calculate(&padded)
}
