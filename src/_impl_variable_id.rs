use crate::VariableId;
use std::fmt::{Display, Error, Formatter};

impl VariableId {
    /// Construct a `VariableId` from a raw index.
    ///
    /// Only use this if you know the index is valid in your network.
    pub fn from_index(index: usize) -> VariableId {
        VariableId(index)
    }

    /// Convert this `VariableId` into a raw index.
    pub fn to_index(self) -> usize {
        self.0
    }
}

impl From<usize> for VariableId {
    fn from(val: usize) -> Self {
        VariableId(val)
    }
}

impl From<VariableId> for usize {
    fn from(val: VariableId) -> Self {
        val.0
    }
}

impl Display for VariableId {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "v_{}", self.0)
    }
}
