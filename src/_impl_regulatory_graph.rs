use crate::signed_graph::Sign;
use crate::{
    Regulation, RegulationIterator, RegulatoryGraph, Variable, VariableId, VariableIdIterator,
    ID_REGEX,
};
use std::collections::HashMap;
use std::fmt::{Display, Error, Formatter};

impl Regulation {
    pub fn regulator(&self) -> VariableId {
        self.regulator
    }

    pub fn target(&self) -> VariableId {
        self.target
    }

    /// The monotonicity of the regulation, or `None` when the influence
    /// is not monotonous.
    pub fn sign(&self) -> Option<Sign> {
        self.sign
    }
}

/// Methods for safely constructing instances of `RegulatoryGraph`.
impl RegulatoryGraph {
    /// Create a new `RegulatoryGraph` with variables using the given names
    /// and no regulations.
    ///
    /// The ordering of the variables is preserved. Returns an error when a name
    /// is duplicate or not a valid identifier.
    pub fn new(variables: Vec<String>) -> Result<RegulatoryGraph, String> {
        let mut variable_to_index = HashMap::new();
        for (index, name) in variables.iter().enumerate() {
            if !ID_REGEX.is_match(name) {
                return Err(format!("Invalid variable name: `{}`.", name));
            }
            let previous = variable_to_index.insert(name.clone(), VariableId(index));
            if previous.is_some() {
                return Err(format!("Duplicate variable name: `{}`.", name));
            }
        }
        Ok(RegulatoryGraph {
            variables: variables
                .into_iter()
                .map(|name| Variable { name })
                .collect(),
            regulations: Vec::new(),
            variable_to_index,
        })
    }

    /// Add a new regulation into this graph. Duplicate regulations (same
    /// regulator and target) are rejected.
    pub fn add_regulation(
        &mut self,
        regulator: VariableId,
        target: VariableId,
        sign: Option<Sign>,
    ) -> Result<(), String> {
        let exists = self
            .regulations
            .iter()
            .any(|r| r.regulator == regulator && r.target == target);
        if exists {
            return Err(format!(
                "Duplicate regulation `{} -> {}`.",
                self.get_variable_name(regulator),
                self.get_variable_name(target),
            ));
        }
        self.regulations.push(Regulation {
            regulator,
            target,
            sign,
        });
        Ok(())
    }
}

/// Utility methods for exploring the graph.
impl RegulatoryGraph {
    /// The number of variables in this graph.
    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// Find a `VariableId` for the given name, or `None` if the variable
    /// does not exist.
    pub fn find_variable(&self, name: &str) -> Option<VariableId> {
        self.variable_to_index.get(name).cloned()
    }

    /// Return a `Variable` corresponding to the given `VariableId`.
    pub fn get_variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0]
    }

    /// Shorthand for `self.get_variable(id).get_name()`.
    pub fn get_variable_name(&self, id: VariableId) -> &String {
        &self.variables[id.0].name
    }

    /// Return a sorted list of variables that regulate the given `target` variable.
    pub fn regulators(&self, target: VariableId) -> Vec<VariableId> {
        let mut regulators: Vec<VariableId> = self
            .regulations
            .iter()
            .filter(|r| r.target == target)
            .map(|r| r.regulator)
            .collect();
        regulators.sort();
        regulators.dedup();
        regulators
    }

    /// Return a sorted list of variables that are regulated by the given
    /// `regulator` variable.
    pub fn targets(&self, regulator: VariableId) -> Vec<VariableId> {
        let mut targets: Vec<VariableId> = self
            .regulations
            .iter()
            .filter(|r| r.regulator == regulator)
            .map(|r| r.target)
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Find a regulation between the two variables, if it exists.
    pub fn find_regulation(
        &self,
        regulator: VariableId,
        target: VariableId,
    ) -> Option<&Regulation> {
        self.regulations
            .iter()
            .find(|r| r.regulator == regulator && r.target == target)
    }

    /// Return an iterator over all ids of this graph.
    pub fn variables(&self) -> VariableIdIterator {
        (0..self.variables.len()).map(VariableId)
    }

    /// Return an iterator over all regulations of this graph.
    pub fn regulations(&self) -> RegulationIterator {
        self.regulations.iter()
    }
}

impl Variable {
    pub fn get_name(&self) -> &String {
        &self.name
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use crate::signed_graph::Sign;
    use crate::{RegulatoryGraph, VariableId};

    #[test]
    fn basic_regulatory_graph_struct() {
        let mut rg = RegulatoryGraph::new(vec!["a".to_string(), "b".to_string()]).unwrap();
        let a = rg.find_variable("a").unwrap();
        let b = rg.find_variable("b").unwrap();
        rg.add_regulation(a, b, Some(Sign::Positive)).unwrap();
        rg.add_regulation(b, a, Some(Sign::Negative)).unwrap();
        rg.add_regulation(b, b, None).unwrap();
        assert!(rg.add_regulation(a, b, None).is_err());

        assert_eq!(2, rg.num_vars());
        assert_eq!("a", rg.get_variable_name(a));
        assert_eq!(vec![a, b], rg.regulators(b));
        assert_eq!(vec![b], rg.regulators(a));
        assert_eq!(vec![a, b], rg.targets(b));
        assert_eq!(Some(Sign::Positive), rg.find_regulation(a, b).unwrap().sign());
        assert_eq!(None, rg.find_variable("c"));
        assert_eq!(VariableId::from_index(0), a);
    }

    #[test]
    fn invalid_variable_names() {
        assert!(RegulatoryGraph::new(vec!["a{}".to_string()]).is_err());
        assert!(RegulatoryGraph::new(vec!["a".to_string(), "a".to_string()]).is_err());
    }
}
