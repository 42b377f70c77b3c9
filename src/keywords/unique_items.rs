use std::hash::{Hash, Hasher};

use ahash::{AHashSet, AHasher};
use serde_json::{Number, Value};

use crate::keywords::helpers::{as_f64, equal};

// Based on implementation proposed by Sven Marnach:
// https://stackoverflow.com/questions/60882381/what-is-the-fastest-correct-way-to-detect-that-there-are-no-duplicates-in-a-json
pub(crate) struct HashedValue<'a>(&'a Value);

impl PartialEq for HashedValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        equal(self.0, other.0)
    }
}

impl Eq for HashedValue<'_> {}

/// Integral floats hash like the integer they are equal to.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn hash_number<H: Hasher>(number: &Number, state: &mut H) {
    if let Some(number) = number.as_u64() {
        number.hash(state);
    } else if let Some(number) = number.as_i64() {
        number.hash(state);
    } else {
        let value = as_f64(number);
        if value.fract() == 0. && value >= 0. && value < u64::MAX as f64 {
            (value as u64).hash(state);
        } else if value.fract() == 0. && value < 0. && value >= i64::MIN as f64 {
            (value as i64).hash(state);
        } else {
            value.to_bits().hash(state);
        }
    }
}

impl Hash for HashedValue<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0 {
            Value::Null => state.write_u32(3_221_225_473), // chosen randomly
            Value::Bool(ref item) => item.hash(state),
            Value::Number(ref item) => hash_number(item, state),
            Value::String(ref item) => item.hash(state),
            Value::Array(ref items) => {
                for item in items {
                    HashedValue(item).hash(state);
                }
            }
            Value::Object(ref items) => {
                // Order-independent combination of the entries
                let mut hash = 0;
                for (key, value) in items {
                    let mut item_hasher = AHasher::default();
                    key.hash(&mut item_hasher);
                    HashedValue(value).hash(&mut item_hasher);
                    hash ^= item_hasher.finish();
                }
                state.write_u64(hash);
            }
        }
    }
}

// Below this size pairwise comparison is cheaper than hashing every element.
const ITEMS_SIZE_THRESHOLD: usize = 15;

#[inline]
pub(crate) fn is_unique(items: &[Value]) -> bool {
    let size = items.len();
    if size <= 1 {
        true
    } else if let [first, second] = items {
        !equal(first, second)
    } else if size <= ITEMS_SIZE_THRESHOLD {
        items
            .iter()
            .enumerate()
            .all(|(idx, item)| items[idx + 1..].iter().all(|other| !equal(item, other)))
    } else {
        let mut seen = AHashSet::with_capacity(size);
        items.iter().map(HashedValue).all(move |x| seen.insert(x))
    }
}
