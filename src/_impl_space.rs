use crate::ExtendedBoolean::{Any, One, Zero};
use crate::{BooleanNetwork, ExtendedBoolean, Space, VariableId};
use num_bigint::BigUint;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

impl Index<VariableId> for Space {
    type Output = ExtendedBoolean;

    fn index(&self, index: VariableId) -> &Self::Output {
        &self.0[index.to_index()]
    }
}

impl IndexMut<VariableId> for Space {
    fn index_mut(&mut self, index: VariableId) -> &mut Self::Output {
        &mut self.0[index.to_index()]
    }
}

impl Display for Space {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for x in &self.0 {
            write!(f, "{}", x)?;
        }
        Ok(())
    }
}

impl PartialOrd for Space {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }

        let mut is_sub_space = true;
        let mut is_super_space = true;
        for (x, y) in self.0.iter().zip(other.0.iter()) {
            is_sub_space = is_sub_space && x <= y;
            is_super_space = is_super_space && x >= y;
        }
        assert!(!(is_super_space && is_sub_space));
        if is_sub_space {
            Some(Ordering::Less)
        } else if is_super_space {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl Space {
    /// Create a new space tracking the variables of the given network, where all
    /// values are initially assigned as `Any`.
    pub fn new(network: &BooleanNetwork) -> Space {
        Self::new_raw(network.num_vars())
    }

    pub fn new_raw(num_vars: usize) -> Space {
        Space(vec![Any; num_vars])
    }

    /// Convert a list of fixed values into a proper "space" object.
    pub fn from_values(num_vars: usize, values: &[(VariableId, bool)]) -> Space {
        let mut result = Self::new_raw(num_vars);
        for (k, v) in values {
            result[*k] = ExtendedBoolean::from(*v);
        }
        result
    }

    /// Convert a space into a list of fixed values.
    pub fn to_values(&self) -> Vec<(VariableId, bool)> {
        let mut result = Vec::new();
        for (k, v) in self.0.iter().enumerate() {
            if let Some(v) = v.try_as_bool() {
                result.push((VariableId::from_index(k), v))
            }
        }
        result
    }

    /// The number of variables tracked by this space (*not* the dimension).
    pub fn num_vars(&self) -> usize {
        self.0.len()
    }

    /// Try to intersect two spaces. If the result is empty, returns `None`.
    pub fn intersect(&self, other: &Space) -> Option<Space> {
        let mut result = self.clone();
        for i in 0..self.0.len() {
            match (self.0[i], other.0[i]) {
                (One, Zero) | (Zero, One) => {
                    return None;
                }
                (One, Any) | (Any, One) => {
                    result.0[i] = One;
                }
                (Zero, Any) | (Any, Zero) => {
                    result.0[i] = Zero;
                }
                (Zero, Zero) | (One, One) | (Any, Any) => {
                    // Do nothing.
                }
            }
        }
        Some(result)
    }

    /// True if `self` is a sub-space of `other` (i.e. `self` fixes everything
    /// `other` fixes, to the same values).
    pub fn is_subspace(&self, other: &Space) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(x, y)| x <= y)
    }

    /// Count the number of `*` in this space (its dimension).
    pub fn count_any(&self) -> usize {
        self.0.iter().filter(|it| **it == Any).count()
    }

    /// Count the number of `0` and `1` in this space.
    pub fn count_fixed(&self) -> usize {
        self.0.iter().filter(|it| **it != Any).count()
    }

    /// True if every variable is fixed, i.e. the space is a single state.
    pub fn is_singleton(&self) -> bool {
        self.count_any() == 0
    }

    /// The sorted list of variables fixed by this space.
    pub fn fixed_variables(&self) -> Vec<VariableId> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_fixed())
            .map(|(i, _)| VariableId::from_index(i))
            .collect()
    }

    /// The sorted list of variables *not* fixed by this space.
    pub fn free_variables(&self) -> Vec<VariableId> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_any())
            .map(|(i, _)| VariableId::from_index(i))
            .collect()
    }

    /// A unique canonical key of this space: each variable contributes two bits
    /// (`00` free, `10` zero, `11` one), with variable `i` at offset `2 * i`.
    ///
    /// The key provides a total "lexicographic-like" ordering on the spaces of
    /// one network and is used for node deduplication in the succession diagram.
    pub fn unique_key(&self) -> BigUint {
        let mut key = BigUint::default();
        for (i, value) in self.0.iter().enumerate() {
            let code: u8 = match value {
                Any => continue,
                Zero => 0b10,
                One => 0b11,
            };
            key |= BigUint::from(code) << (2 * i);
        }
        key
    }

    /// Enumerate the sub-spaces obtained by fixing each of the given (free)
    /// variables to every combination of Boolean values.
    pub fn completions_over(&self, variables: &[VariableId]) -> Vec<Space> {
        let mut result = vec![self.clone()];
        for var in variables {
            let mut next = Vec::with_capacity(2 * result.len());
            for space in result {
                let mut zero = space.clone();
                zero[*var] = Zero;
                let mut one = space;
                one[*var] = One;
                next.push(zero);
                next.push(one);
            }
            result = next;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::ExtendedBoolean::{One, Zero};
    use crate::{Space, VariableId};

    #[test]
    fn space_ordering_and_intersection() {
        let a = VariableId::from_index(0);
        let b = VariableId::from_index(1);

        let mut x = Space::new_raw(3);
        x[a] = One;
        let mut y = x.clone();
        y[b] = Zero;

        assert!(y < x);
        assert!(y.is_subspace(&x));
        assert!(!x.is_subspace(&y));
        assert_eq!(Some(y.clone()), x.intersect(&y));

        let mut z = Space::new_raw(3);
        z[a] = Zero;
        assert_eq!(None, z.intersect(&x));
        assert!(z.partial_cmp(&y).is_none());
    }

    #[test]
    fn space_unique_key() {
        let a = VariableId::from_index(0);
        let b = VariableId::from_index(1);

        let mut x = Space::new_raw(2);
        x[a] = One;
        let mut y = Space::new_raw(2);
        y[b] = One;
        let mut z = Space::new_raw(2);
        z[a] = Zero;

        assert_ne!(x.unique_key(), y.unique_key());
        assert_ne!(x.unique_key(), z.unique_key());
        assert_eq!(x.unique_key(), x.clone().unique_key());
    }

    #[test]
    fn space_completions() {
        let a = VariableId::from_index(0);
        let b = VariableId::from_index(1);
        let space = Space::new_raw(3);
        let completions = space.completions_over(&[a, b]);
        assert_eq!(4, completions.len());
        for c in &completions {
            assert_eq!(2, c.count_fixed());
            assert!(c.is_subspace(&space));
        }
    }
}
