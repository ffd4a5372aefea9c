use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use strum::{Display, EnumIter};

use crate::{error::Error, memory::SegmentKind, width::Width};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
pub enum Category {
    SegmentSelect,
    DataEmit,
    Alignment,
    SymbolDeclare,
    MacroBegin,
    MacroEnd,
    Include,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum NumericKind {
    Integer,
    Float,
}

/// What a symbol declaration binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum SymbolKind {
    /// Label visible to other units.
    Global,
    /// Label plus byte length, reserved in the extern area.
    Extern,
    /// Textual substitution.
    Equate,
}

/// Payload carried by a data directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmitKind {
    Numeric(NumericKind),
    Text { terminated: bool },
    Space,
}

#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Directive {
    token: &'static str,
    description: &'static str,
    category: Category,
    segment: Option<SegmentKind>,
    emit: Option<(Width, EmitKind)>,
    symbol: Option<SymbolKind>,
}

const fn select(token: &'static str, segment: SegmentKind, description: &'static str) -> Directive {
    Directive {
        token,
        description,
        category: Category::SegmentSelect,
        segment: Some(segment),
        emit: None,
        symbol: None,
    }
}

const fn data(
    token: &'static str,
    width: Width,
    kind: EmitKind,
    description: &'static str,
) -> Directive {
    Directive {
        token,
        description,
        category: Category::DataEmit,
        segment: None,
        emit: Some((width, kind)),
        symbol: None,
    }
}

const fn other(token: &'static str, category: Category, description: &'static str) -> Directive {
    Directive {
        token,
        description,
        category,
        segment: None,
        emit: None,
        symbol: None,
    }
}

const fn declare(token: &'static str, symbol: SymbolKind, description: &'static str) -> Directive {
    Directive {
        token,
        description,
        category: Category::SymbolDeclare,
        segment: None,
        emit: None,
        symbol: Some(symbol),
    }
}

const INTEGER: EmitKind = EmitKind::Numeric(NumericKind::Integer);
const FLOAT: EmitKind = EmitKind::Numeric(NumericKind::Float);

// New directives are added here; nothing else dispatches on the token.
static DIRECTIVES: [Directive; 20] = [
    select(".data", SegmentKind::Data, "Subsequent items stored in Data segment at next available address"),
    select(".text", SegmentKind::Text, "Subsequent items (instructions) stored in Text segment at next available address"),
    data(".word", Width::Word, INTEGER, "Store the listed value(s) as 32 bit words on word boundary"),
    data(".ascii", Width::Byte, EmitKind::Text { terminated: false }, "Store the string in the Data segment but do not add null terminator"),
    data(".asciiz", Width::Byte, EmitKind::Text { terminated: true }, "Store the string in the Data segment and add null terminator"),
    data(".byte", Width::Byte, INTEGER, "Store the listed value(s) as 8 bit bytes"),
    other(".align", Category::Alignment, "Align next data item on specified byte boundary (0=byte, 1=half, 2=word, 3=double)"),
    data(".half", Width::Half, INTEGER, "Store the listed value(s) as 16 bit halfwords on halfword boundary"),
    data(".space", Width::Byte, EmitKind::Space, "Reserve the next specified number of bytes in Data segment"),
    data(".double", Width::Double, FLOAT, "Store the listed value(s) as double precision floating point"),
    data(".float", Width::Word, FLOAT, "Store the listed value(s) as single precision floating point"),
    declare(".extern", SymbolKind::Extern, "Declare the listed label and byte length to be a global data field"),
    select(".kdata", SegmentKind::KernelData, "Subsequent items stored in Kernel Data segment at next available address"),
    select(".ktext", SegmentKind::KernelText, "Subsequent items (instructions) stored in Kernel Text segment at next available address"),
    declare(".globl", SymbolKind::Global, "Declare the listed label(s) as global to enable referencing from other files"),
    other(".set", Category::Ignored, "Set assembler variables.  Currently ignored but included for SPIM compatability"),
    declare(".eqv", SymbolKind::Equate, "Substitute second operand for first. First operand is symbol, second operand is expression (like #define)"),
    other(".macro", Category::MacroBegin, "Begin macro definition.  See .end_macro"),
    other(".end_macro", Category::MacroEnd, "End macro definition.  See .macro"),
    other(".include", Category::Include, "Insert the contents of the specified file.  Put filename in quotes."),
];

static BY_TOKEN: Lazy<HashMap<&'static str, &'static Directive>> =
    Lazy::new(|| DIRECTIVES.iter().map(|d| (d.token, d)).collect());

impl Directive {
    /// Case-insensitive exact match.
    pub fn lookup(token: &str) -> Result<&'static Directive, Error> {
        BY_TOKEN
            .get(token.to_lowercase().as_str())
            .copied()
            .ok_or_else(|| Error::DirectiveNotFound(token.to_string()))
    }

    /// Every directive whose token starts with `prefix`, e.g. ".a" gives
    /// `.ascii`, `.asciiz` and `.align`. Empty when nothing matches.
    pub fn prefix_match(prefix: &str) -> Vec<&'static Directive> {
        DIRECTIVES
            .iter()
            .filter(|d| d.token.starts_with(prefix))
            .collect()
    }

    /// The whole catalog in help-listing order.
    pub fn all() -> &'static [Directive] {
        &DIRECTIVES
    }

    pub fn name(&self) -> &'static str {
        self.token
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Target of a segment-select directive.
    pub fn segment(&self) -> Option<SegmentKind> {
        self.segment
    }

    pub fn emit(&self) -> Option<(Width, EmitKind)> {
        self.emit
    }

    /// What a symbol-declaring directive binds.
    pub fn symbol(&self) -> Option<SymbolKind> {
        self.symbol
    }

    pub fn element_size(&self) -> Option<Width> {
        self.emit.map(|(width, _)| width)
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self.emit {
            Some((_, EmitKind::Numeric(kind))) => Some(kind),
            _ => None,
        }
    }

    pub fn classify(&self) -> (Category, Option<Width>, Option<NumericKind>) {
        (self.category, self.element_size(), self.numeric_kind())
    }

    pub fn is_integer(&self) -> bool {
        self.numeric_kind() == Some(NumericKind::Integer)
    }

    pub fn is_float(&self) -> bool {
        self.numeric_kind() == Some(NumericKind::Float)
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}
