//! A parser for the `.bnet` (BoolNet) model format.
//!
//! The format consists of a (optional) `targets, factors` header followed by one
//! line per variable: `name, expression`. Expressions use `!`, `&`, `|`, `^`,
//! `=>` and `<=>` with the usual priorities, plus parentheses and the constants
//! `0`/`1`/`true`/`false`. Lines starting with `#` are comments. A variable that
//! only appears on the right-hand side is a free input.

use crate::{AnalysisError, BinaryOp, BooleanNetwork, FnUpdate, VariableId};
use std::collections::{HashMap, HashSet};
use std::iter::Peekable;
use std::str::Chars;

/// **(internal)** An intermediate update-function tree using variable names
/// instead of ids (the ids only exist once all lines are read).
#[derive(Clone, Debug, Eq, PartialEq)]
enum FnUpdateTemp {
    Const(bool),
    Var(String),
    Not(Box<FnUpdateTemp>),
    Binary(BinaryOp, Box<FnUpdateTemp>, Box<FnUpdateTemp>),
}

impl FnUpdateTemp {
    /// Add all variable names used by this function to the given set.
    fn dump_variables(&self, result: &mut HashSet<String>) {
        match self {
            FnUpdateTemp::Const(_) => (),
            FnUpdateTemp::Var(name) => {
                result.insert(name.clone());
            }
            FnUpdateTemp::Not(inner) => inner.dump_variables(result),
            FnUpdateTemp::Binary(_, l, r) => {
                l.dump_variables(result);
                r.dump_variables(result);
            }
        }
    }

    /// Resolve variable names into ids using the given lookup table.
    fn into_fn_update(self, index: &HashMap<String, VariableId>) -> FnUpdate {
        match self {
            FnUpdateTemp::Const(value) => FnUpdate::Const(value),
            FnUpdateTemp::Var(name) => FnUpdate::Var(index[&name]),
            FnUpdateTemp::Not(inner) => FnUpdate::mk_not(inner.into_fn_update(index)),
            FnUpdateTemp::Binary(op, l, r) => {
                FnUpdate::mk_binary(op, l.into_fn_update(index), r.into_fn_update(index))
            }
        }
    }
}

impl BooleanNetwork {
    /// Try to load a Boolean network from a `.bnet` model string.
    ///
    /// This is a "best effort" implementation covering the standard logical
    /// operators; models with uninterpreted functions are rejected.
    pub fn try_from_bnet(model_string: &str) -> Result<BooleanNetwork, AnalysisError> {
        Self::try_from_bnet_string(model_string)
            .map_err(AnalysisError::MalformedInput)
    }

    fn try_from_bnet_string(model_string: &str) -> Result<BooleanNetwork, String> {
        let mut model_map: HashMap<String, FnUpdateTemp> = HashMap::new();
        let mut variables = HashSet::new();
        for line in model_string.lines() {
            let line = line.trim();
            if line.starts_with('#') || line.is_empty() || line.starts_with("targets,") {
                continue; // Skip comments, empty lines and the header.
            }
            let Some((name, function)) = line.split_once(',') else {
                return Err(format!("Unexpected line: `{}`.", line));
            };

            let variable_name = name.trim().to_string();
            if model_map.contains_key(&variable_name) {
                return Err(format!(
                    "Duplicate function declaration for `{}`.",
                    variable_name
                ));
            }

            // Also scan regulators for variable names, as free inputs don't need
            // to have a function line of their own.
            variables.insert(variable_name.clone());
            let function = parse_bnet_function(function.trim())?;
            function.dump_variables(&mut variables);

            model_map.insert(variable_name, function);
        }

        if variables.is_empty() {
            return Err("The model is empty.".to_string());
        }

        let mut variables = variables.into_iter().collect::<Vec<_>>();
        variables.sort();
        let mut network = BooleanNetwork::new(variables.clone())?;

        let index: HashMap<String, VariableId> = variables
            .iter()
            .map(|name| (name.clone(), network.as_graph().find_variable(name).unwrap()))
            .collect();

        for (variable, function) in model_map {
            let id = index[&variable];
            // A variable declared as its own identity is a source; we keep it
            // as a free input so that downstream analysis can recognise it.
            if function == FnUpdateTemp::Var(variable.clone()) {
                continue;
            }
            network.add_update_function(id, function.into_fn_update(&index))?;
        }

        network.infer_regulatory_graph();
        Ok(network)
    }
}

/// **(internal)** An enum of possible tokens occurring in a `.bnet` expression.
#[derive(Debug, Eq, PartialEq)]
enum Token {
    Not,                // '!'
    And,                // '&'
    Or,                 // '|'
    Xor,                // '^'
    Imp,                // '=>'
    Iff,                // '<=>'
    Name(String),       // 'name'
    Tokens(Vec<Token>), // A block of tokens inside parentheses
}

fn parse_bnet_function(value: &str) -> Result<FnUpdateTemp, String> {
    let tokens = tokenize_group(&mut value.chars().peekable(), true)?;
    Ok(*parse_formula(&tokens)?)
}

/// **(internal)** Process a peekable iterator of characters into a vector of
/// `Token`s.
///
/// The outer method always consumes the opening parenthesis and the recursive
/// call consumes the closing parenthesis. Use `top_level` to indicate that
/// there will be no closing parenthesis.
fn tokenize_group(data: &mut Peekable<Chars>, top_level: bool) -> Result<Vec<Token>, String> {
    let mut output = Vec::new();
    while let Some(c) = data.next() {
        match c {
            c if c.is_whitespace() => { /* Skip whitespace */ }
            '!' => output.push(Token::Not),
            '&' => output.push(Token::And),
            '|' => output.push(Token::Or),
            '^' => output.push(Token::Xor),
            '=' => {
                if Some('>') == data.next() {
                    output.push(Token::Imp);
                } else {
                    return Err("Expected '>' after '='.".to_string());
                }
            }
            '<' => {
                if Some('=') == data.next() && Some('>') == data.next() {
                    output.push(Token::Iff);
                } else {
                    return Err("Expected '=>' after '<'.".to_string());
                }
            }
            '>' => return Err("Unexpected '>'.".to_string()),
            ')' => {
                return if !top_level {
                    Ok(output)
                } else {
                    Err("Unexpected ')'.".to_string())
                };
            }
            '(' => {
                let tokens = tokenize_group(data, false)?;
                output.push(Token::Tokens(tokens));
            }
            c if is_valid_in_name(c) => {
                let mut name = vec![c];
                while let Some(c) = data.peek() {
                    if c.is_whitespace() || !is_valid_in_name(*c) {
                        break;
                    } else {
                        name.push(*c);
                        data.next(); // advance iterator
                    }
                }
                output.push(Token::Name(name.into_iter().collect()));
            }
            _ => return Err(format!("Unexpected '{}'.", c)),
        }
    }
    if top_level {
        Ok(output)
    } else {
        Err("Expected ')'.".to_string())
    }
}

/// **(internal)** Check if given char can appear in a name.
fn is_valid_in_name(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// **(internal)** Utility method to find the first occurrence of a specific
/// token in the token tree.
fn index_of_first(data: &[Token], token: Token) -> Option<usize> {
    data.iter().position(|t| *t == token)
}

fn parse_formula(data: &[Token]) -> Result<Box<FnUpdateTemp>, String> {
    iff(data)
}

/// **(internal)** Recursive parsing step 1: extract `<=>` operators.
fn iff(data: &[Token]) -> Result<Box<FnUpdateTemp>, String> {
    let iff_token = index_of_first(data, Token::Iff);
    Ok(if let Some(i) = iff_token {
        Box::new(FnUpdateTemp::Binary(
            BinaryOp::Iff,
            imp(&data[..i])?,
            iff(&data[(i + 1)..])?,
        ))
    } else {
        imp(data)?
    })
}

/// **(internal)** Recursive parsing step 2: extract `=>` operators.
fn imp(data: &[Token]) -> Result<Box<FnUpdateTemp>, String> {
    let imp_token = index_of_first(data, Token::Imp);
    Ok(if let Some(i) = imp_token {
        Box::new(FnUpdateTemp::Binary(
            BinaryOp::Imp,
            or(&data[..i])?,
            imp(&data[(i + 1)..])?,
        ))
    } else {
        or(data)?
    })
}

/// **(internal)** Recursive parsing step 3: extract `|` operators.
fn or(data: &[Token]) -> Result<Box<FnUpdateTemp>, String> {
    let or_token = index_of_first(data, Token::Or);
    Ok(if let Some(i) = or_token {
        Box::new(FnUpdateTemp::Binary(
            BinaryOp::Or,
            and(&data[..i])?,
            or(&data[(i + 1)..])?,
        ))
    } else {
        and(data)?
    })
}

/// **(internal)** Recursive parsing step 4: extract `&` operators.
fn and(data: &[Token]) -> Result<Box<FnUpdateTemp>, String> {
    let and_token = index_of_first(data, Token::And);
    Ok(if let Some(i) = and_token {
        Box::new(FnUpdateTemp::Binary(
            BinaryOp::And,
            xor(&data[..i])?,
            and(&data[(i + 1)..])?,
        ))
    } else {
        xor(data)?
    })
}

/// **(internal)** Recursive parsing step 5: extract `^` operators.
fn xor(data: &[Token]) -> Result<Box<FnUpdateTemp>, String> {
    let xor_token = index_of_first(data, Token::Xor);
    Ok(if let Some(i) = xor_token {
        Box::new(FnUpdateTemp::Binary(
            BinaryOp::Xor,
            terminal(&data[..i])?,
            xor(&data[(i + 1)..])?,
        ))
    } else {
        terminal(data)?
    })
}

/// **(internal)** Recursive parsing step 6: extract terminals and negations.
fn terminal(data: &[Token]) -> Result<Box<FnUpdateTemp>, String> {
    if data.is_empty() {
        return Err("Expected formula, found nothing.".to_string());
    }
    if data[0] == Token::Not {
        return Ok(Box::new(FnUpdateTemp::Not(terminal(&data[1..])?)));
    } else if data.len() == 1 {
        // This should be either a name or a parenthesis group, anything else
        // does not make sense.
        match &data[0] {
            Token::Name(name) => {
                return if name == "true" || name == "1" {
                    Ok(Box::new(FnUpdateTemp::Const(true)))
                } else if name == "false" || name == "0" {
                    Ok(Box::new(FnUpdateTemp::Const(false)))
                } else {
                    Ok(Box::new(FnUpdateTemp::Var(name.clone())))
                };
            }
            Token::Tokens(inner) => return parse_formula(inner),
            _ => {} // otherwise, fall through to the error at the end.
        }
    }
    Err(format!("Unexpected: {:?}. Expecting formula.", data))
}

#[cfg(test)]
mod tests {
    use crate::BooleanNetwork;

    const BNET_MODEL: &str = r"# a small signalling cascade
targets, factors
input_a,  input_a
stress,   stress
kinase,   input_a & !phosphatase
phosphatase, stress | (kinase ^ stress)
output,   kinase <=> phosphatase
";

    #[test]
    fn read_bnet() {
        let network = BooleanNetwork::try_from_bnet(BNET_MODEL).unwrap();
        assert_eq!(5, network.num_vars());

        // Inputs declared as identities are kept as free inputs.
        let input = network.as_graph().find_variable("input_a").unwrap();
        assert!(network.get_update_function(input).is_none());

        let kinase = network.as_graph().find_variable("kinase").unwrap();
        assert!(network.get_update_function(kinase).is_some());

        let phos = network.as_graph().find_variable("phosphatase").unwrap();
        assert_eq!(
            vec![kinase, network.as_graph().find_variable("stress").unwrap()],
            network
                .get_update_function(phos)
                .as_ref()
                .unwrap()
                .collect_arguments()
        );
    }

    #[test]
    fn operator_priority() {
        let network = BooleanNetwork::try_from_bnet("x, a & b | c => d ^ e <=> f").unwrap();
        let x = network.as_graph().find_variable("x").unwrap();
        let function = network.get_update_function(x).as_ref().unwrap();
        // ((((a & b) | c) => (d ^ e)) <=> f)
        assert_eq!(
            "((((a & b) | c) => (d ^ e)) <=> f)",
            function.to_string(&network)
        );
    }

    #[test]
    fn reject_invalid_models() {
        assert!(BooleanNetwork::try_from_bnet("a, b &").is_err());
        assert!(BooleanNetwork::try_from_bnet("a, (b").is_err());
        assert!(BooleanNetwork::try_from_bnet("a, f(b, c)").is_err());
        assert!(BooleanNetwork::try_from_bnet("a, b, c").is_err());
        assert!(BooleanNetwork::try_from_bnet("a, b\na, c").is_err());
        assert!(BooleanNetwork::try_from_bnet("").is_err());
    }
}
