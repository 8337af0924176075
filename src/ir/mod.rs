//! Arithmetic IR emitted by the typed value layer
//!
//! A deliberately small, straight-line IR: the staged values in
//! [`crate::types`] wrap ids of values in a function under construction and
//! their operations append ops here. Control flow, optimization, and the
//! lowering pipeline live outside this crate; what remains is exactly the op
//! set the value layer needs, plus a textual dump used by the
//! `emit-intermediate-dump` option.

use std::fmt;

/// Signedness of an integer IR type.
///
/// The value layer only ever *adopts* signless integers; signed and unsigned
/// variants exist so foreign values can be described (and rejected) with a
/// precise diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signless,
    Signed,
    Unsigned,
}

/// IR-level type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    Int { width: u32, signedness: Signedness },
    F16,
    F32,
    F64,
    Index,
}

impl IrType {
    /// Signless integer of the given width.
    pub const fn int(width: u32) -> Self {
        IrType::Int {
            width,
            signedness: Signedness::Signless,
        }
    }

    pub const BOOL: IrType = IrType::int(1);

    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F16 | IrType::F32 | IrType::F64)
    }

    /// Bit width of a float type; integers carry theirs inline.
    pub fn float_width(&self) -> Option<u32> {
        match self {
            IrType::F16 => Some(16),
            IrType::F32 => Some(32),
            IrType::F64 => Some(64),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Int {
                width,
                signedness: Signedness::Signless,
            } => write!(f, "i{width}"),
            IrType::Int {
                width,
                signedness: Signedness::Signed,
            } => write!(f, "si{width}"),
            IrType::Int {
                width,
                signedness: Signedness::Unsigned,
            } => write!(f, "ui{width}"),
            IrType::F16 => write!(f, "f16"),
            IrType::F32 => write!(f, "f32"),
            IrType::F64 => write!(f, "f64"),
            IrType::Index => write!(f, "index"),
        }
    }
}

/// Value identifier within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IrValue(pub u32);

impl fmt::Display for IrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Integer comparison predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl IntPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
            IntPredicate::Ult => "ult",
            IntPredicate::Ule => "ule",
            IntPredicate::Ugt => "ugt",
            IntPredicate::Uge => "uge",
        }
    }
}

/// Ordered float comparison predicate (NaN compares false).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl FloatPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        }
    }
}

/// IR operation.
#[derive(Debug, Clone, PartialEq)]
pub enum IrOp {
    /// Integer constant (also covers i1 booleans and index literals)
    ConstInt { value: i128 },
    /// Float constant
    ConstFloat { value: f64 },
    // Integer arithmetic
    AddI(IrValue, IrValue),
    SubI(IrValue, IrValue),
    MulI(IrValue, IrValue),
    /// Signed floor division
    FloorDivSI(IrValue, IrValue),
    /// Unsigned division
    DivUI(IrValue, IrValue),
    /// Integer comparison, result is i1
    CmpI {
        pred: IntPredicate,
        lhs: IrValue,
        rhs: IrValue,
    },
    // Bitwise (used on i1 by the boolean connectives)
    AndI(IrValue, IrValue),
    OrI(IrValue, IrValue),
    /// select(cond, then, else)
    Select {
        cond: IrValue,
        then_value: IrValue,
        else_value: IrValue,
    },
    // Integer width/kind conversions
    ExtSI(IrValue),
    ExtUI(IrValue),
    SiToFp(IrValue),
    UiToFp(IrValue),
    // Float arithmetic
    AddF(IrValue, IrValue),
    SubF(IrValue, IrValue),
    MulF(IrValue, IrValue),
    DivF(IrValue, IrValue),
    NegF(IrValue),
    PowF(IrValue, IrValue),
    /// Float comparison, result is i1
    CmpF {
        pred: FloatPredicate,
        lhs: IrValue,
        rhs: IrValue,
    },
    // Float width conversions
    ExtF(IrValue),
    TruncF(IrValue),
    // Index family
    IndexAdd(IrValue, IrValue),
    IndexSub(IrValue, IrValue),
    IndexMul(IrValue, IrValue),
    /// index -> unsigned integer
    IndexCastU(IrValue),
}

impl IrOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IrOp::ConstInt { .. } | IrOp::ConstFloat { .. } => "const",
            IrOp::AddI(..) => "addi",
            IrOp::SubI(..) => "subi",
            IrOp::MulI(..) => "muli",
            IrOp::FloorDivSI(..) => "floordivsi",
            IrOp::DivUI(..) => "divui",
            IrOp::CmpI { .. } => "cmpi",
            IrOp::AndI(..) => "andi",
            IrOp::OrI(..) => "ori",
            IrOp::Select { .. } => "select",
            IrOp::ExtSI(..) => "extsi",
            IrOp::ExtUI(..) => "extui",
            IrOp::SiToFp(..) => "sitofp",
            IrOp::UiToFp(..) => "uitofp",
            IrOp::AddF(..) => "addf",
            IrOp::SubF(..) => "subf",
            IrOp::MulF(..) => "mulf",
            IrOp::DivF(..) => "divf",
            IrOp::NegF(..) => "negf",
            IrOp::PowF(..) => "powf",
            IrOp::CmpF { .. } => "cmpf",
            IrOp::ExtF(..) => "extf",
            IrOp::TruncF(..) => "truncf",
            IrOp::IndexAdd(..) => "index.add",
            IrOp::IndexSub(..) => "index.sub",
            IrOp::IndexMul(..) => "index.mul",
            IrOp::IndexCastU(..) => "index_castui",
        }
    }

    fn operands(&self) -> Vec<IrValue> {
        match *self {
            IrOp::ConstInt { .. } | IrOp::ConstFloat { .. } => Vec::new(),
            IrOp::AddI(a, b)
            | IrOp::SubI(a, b)
            | IrOp::MulI(a, b)
            | IrOp::FloorDivSI(a, b)
            | IrOp::DivUI(a, b)
            | IrOp::AndI(a, b)
            | IrOp::OrI(a, b)
            | IrOp::AddF(a, b)
            | IrOp::SubF(a, b)
            | IrOp::MulF(a, b)
            | IrOp::DivF(a, b)
            | IrOp::PowF(a, b)
            | IrOp::IndexAdd(a, b)
            | IrOp::IndexSub(a, b)
            | IrOp::IndexMul(a, b) => vec![a, b],
            IrOp::CmpI { lhs, rhs, .. } | IrOp::CmpF { lhs, rhs, .. } => vec![lhs, rhs],
            IrOp::Select {
                cond,
                then_value,
                else_value,
            } => vec![cond, then_value, else_value],
            IrOp::ExtSI(a)
            | IrOp::ExtUI(a)
            | IrOp::SiToFp(a)
            | IrOp::UiToFp(a)
            | IrOp::NegF(a)
            | IrOp::ExtF(a)
            | IrOp::TruncF(a)
            | IrOp::IndexCastU(a) => vec![a],
        }
    }
}

/// One emitted instruction: result id, op, result type.
#[derive(Debug, Clone, PartialEq)]
pub struct IrInstr {
    pub result: IrValue,
    pub op: IrOp,
    pub ty: IrType,
}

/// Function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct IrParam {
    pub value: IrValue,
    pub name: String,
    pub ty: IrType,
}

/// A finished straight-line function.
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<IrParam>,
    pub instrs: Vec<IrInstr>,
    pub results: Vec<IrValue>,
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func @{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", p.value, p.ty)?;
        }
        writeln!(f, ") {{")?;
        for instr in &self.instrs {
            write!(f, "  {} = ", instr.result)?;
            match &instr.op {
                IrOp::ConstInt { value } => write!(f, "const {value}")?,
                IrOp::ConstFloat { value } => write!(f, "const {value:?}")?,
                IrOp::CmpI { pred, .. } => {
                    write!(f, "cmpi {}", pred.mnemonic())?;
                    for v in instr.op.operands() {
                        write!(f, ", {v}")?;
                    }
                }
                IrOp::CmpF { pred, .. } => {
                    write!(f, "cmpf {}", pred.mnemonic())?;
                    for v in instr.op.operands() {
                        write!(f, ", {v}")?;
                    }
                }
                op => {
                    write!(f, "{}", op.mnemonic())?;
                    for (i, v) in op.operands().into_iter().enumerate() {
                        if i == 0 {
                            write!(f, " {v}")?;
                        } else {
                            write!(f, ", {v}")?;
                        }
                    }
                }
            }
            writeln!(f, " : {}", instr.ty)?;
        }
        write!(f, "  return")?;
        for (i, v) in self.results.iter().enumerate() {
            if i == 0 {
                write!(f, " {v}")?;
            } else {
                write!(f, ", {v}")?;
            }
        }
        writeln!(f)?;
        write!(f, "}}")
    }
}

/// A named collection of functions; the unit the lowering toolchain consumes.
#[derive(Debug, Clone, Default)]
pub struct IrModule {
    pub name: String,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module @{} {{", self.name)?;
        for func in &self.functions {
            for line in func.to_string().lines() {
                writeln!(f, "  {line}")?;
            }
        }
        write!(f, "}}")
    }
}

/// Builder for one function: allocates value ids and tracks each value's
/// type so the value layer can validate adoptions.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    params: Vec<IrParam>,
    instrs: Vec<IrInstr>,
    types: Vec<IrType>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            instrs: Vec::new(),
            types: Vec::new(),
        }
    }

    fn fresh(&mut self, ty: IrType) -> IrValue {
        let id = IrValue(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Declare a parameter. Parameters must be declared before any op is
    /// emitted so that ids stay in source order.
    pub fn add_param(&mut self, name: impl Into<String>, ty: IrType) -> IrValue {
        let value = self.fresh(ty);
        self.params.push(IrParam {
            value,
            name: name.into(),
            ty,
        });
        value
    }

    /// Append an op and return the id of its result.
    pub fn emit(&mut self, op: IrOp, ty: IrType) -> IrValue {
        let result = self.fresh(ty);
        self.instrs.push(IrInstr { result, op, ty });
        result
    }

    /// Type of a value produced in this function, if the id belongs here.
    pub fn value_type(&self, value: IrValue) -> Option<IrType> {
        self.types.get(value.0 as usize).copied()
    }

    /// Ops emitted so far, in emission order.
    pub fn instrs(&self) -> &[IrInstr] {
        &self.instrs
    }

    pub fn finish(self, results: Vec<IrValue>) -> IrFunction {
        IrFunction {
            name: self.name,
            params: self.params,
            instrs: self.instrs,
            results,
        }
    }
}
