use arch::{Category, Directive, EmitKind, Error, MemoryConfig, NumericKind, SymbolKind, Width};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::allocator::{Allocation, Allocator, Layout};

// ----------------------------------------------------------------------------
// Statement

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Int(i64),
    Float(f64),
    Text(String),
}

/// One tokenized source line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default)]
    pub label: Option<String>,
    pub directive: String,
    #[serde(default)]
    pub operands: Vec<Operand>,
}

impl Stmt {
    pub fn new(directive: &str, operands: Vec<Operand>) -> Self {
        Stmt {
            label: None,
            directive: directive.to_string(),
            operands,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn parse_yaml(src: &str) -> Result<Vec<Stmt>, Error> {
        Ok(serde_yaml::from_str(src)?)
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Int(n) => write!(f, "{n}"),
            Operand::Float(x) => write!(f, "{x:?}"),
            Operand::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{label}: ")?;
        }
        write!(f, "{}", self.directive)?;
        for (i, op) in self.operands.iter().enumerate() {
            write!(f, "{}{op}", if i == 0 { " " } else { ", " })?;
        }
        Ok(())
    }
}

fn bad(directive: &Directive, reason: &str) -> Error {
    Error::BadOperand {
        directive: directive.name().to_string(),
        reason: reason.to_string(),
    }
}

fn single_int(directive: &Directive, operands: &[Operand]) -> Result<i64, Error> {
    match operands {
        [Operand::Int(n)] => Ok(*n),
        _ => Err(bad(directive, "expected one integer")),
    }
}

// ----------------------------------------------------------------------------
// Apply

/// Applies one directive to the allocator. Directives that reserve no
/// storage return an empty list.
pub fn apply(
    alloc: &mut Allocator,
    directive: &Directive,
    operands: &[Operand],
) -> Result<Vec<Allocation>, Error> {
    match directive.category() {
        Category::SegmentSelect => {
            if !operands.is_empty() {
                return Err(bad(directive, "segment address operand is not supported"));
            }
            if let Some(segment) = directive.segment() {
                alloc.select(segment);
            }
            Ok(vec![])
        }
        Category::Alignment => {
            let exponent = single_int(directive, operands)?;
            let exponent =
                u32::try_from(exponent).map_err(|_| bad(directive, "negative exponent"))?;
            alloc.align(exponent)?;
            Ok(vec![])
        }
        Category::DataEmit => {
            if alloc.current().is_text() {
                return Err(Error::DataDirectiveInTextSegment(
                    directive.name().to_string(),
                ));
            }
            match directive.emit() {
                Some((width, kind)) => emit(alloc, directive, width, kind, operands),
                None => Ok(vec![]),
            }
        }
        Category::SymbolDeclare if directive.symbol() == Some(SymbolKind::Extern) => match operands {
            [Operand::Text(_), Operand::Int(size)] => {
                let size = u32::try_from(*size).map_err(|_| bad(directive, "bad size"))?;
                Ok(vec![alloc.reserve_extern(size)?])
            }
            _ => Err(bad(directive, "expected label and byte length")),
        },
        _ => Ok(vec![]),
    }
}

fn emit(
    alloc: &mut Allocator,
    directive: &Directive,
    width: Width,
    kind: EmitKind,
    operands: &[Operand],
) -> Result<Vec<Allocation>, Error> {
    match kind {
        EmitKind::Numeric(numeric) => {
            if operands.is_empty() {
                return Err(bad(directive, "expected at least one value"));
            }
            let ok = operands.iter().all(|op| match (numeric, op) {
                (_, Operand::Int(_)) => true,
                (NumericKind::Float, Operand::Float(_)) => true,
                _ => false,
            });
            if !ok {
                return Err(bad(directive, "operand kind does not match directive"));
            }
            alloc.emit(width, operands.len())
        }
        EmitKind::Text { terminated } => {
            let mut len = 0;
            for op in operands {
                match op {
                    Operand::Text(s) => len += s.len() + terminated as usize,
                    _ => return Err(bad(directive, "expected string")),
                }
            }
            alloc.emit(width, len)
        }
        EmitKind::Space => {
            let n = single_int(directive, operands)?;
            let n = u32::try_from(n).map_err(|_| bad(directive, "bad byte count"))?;
            Ok(vec![alloc.reserve(n)?])
        }
    }
}

// ----------------------------------------------------------------------------
// Whole unit

#[derive(Debug)]
pub struct Assembled {
    pub symbols: IndexMap<String, Allocation>,
    pub redefined: Vec<String>,
    pub layout: Layout,
}

/// Lays out a statement stream. A label names the first item its statement
/// reserves, or the current address when it reserves nothing.
/// On failure the index of the offending statement is returned with the error.
pub fn layout(config: MemoryConfig, stmts: &[Stmt]) -> Result<Assembled, (usize, Error)> {
    let mut alloc = Allocator::new(config);
    let mut symbols = IndexMap::new();
    let mut redefined = vec![];

    for (idx, stmt) in stmts.iter().enumerate() {
        let directive = Directive::lookup(&stmt.directive).map_err(|e| (idx, e))?;
        let items = apply(&mut alloc, directive, &stmt.operands).map_err(|e| (idx, e))?;

        let mut bind = |name: &str, item: Allocation| {
            if symbols.insert(name.to_string(), item).is_some() {
                redefined.push(name.to_string());
            }
        };

        if let (Some(SymbolKind::Extern), Some(Operand::Text(name)), Some(item)) =
            (directive.symbol(), stmt.operands.first(), items.first())
        {
            bind(name.as_str(), *item);
        }
        if let Some(label) = &stmt.label {
            let item = match items.first() {
                Some(item) => *item,
                None => Allocation {
                    segment: alloc.current(),
                    address: alloc.address().map_err(|e| (idx, e))?,
                    size: 0,
                },
            };
            bind(label.as_str(), item);
        }
    }

    Ok(Assembled {
        symbols,
        redefined,
        layout: alloc.finish(),
    })
}
