/// Defines assembly tree datatypes

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub func: Func,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Mov {
        src: Operand,
        dest: Operand,
    },
    Unary {
        op: UnaryOp,
        dest: Operand,
    },
    Binary {
        op: BinaryOp,
        src: Operand,
        dest: Operand,
    },
    Cmp(Operand, Operand),
    Idiv(Operand),
    Cdq,
    Jmp {
        label: String,
    },
    JmpCond {
        condition: Condition,
        label: String,
    },
    SetCond {
        condition: Condition,
        dest: Operand,
    },
    Label(String),
    AllocateStack(i32),
    Ret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    And,
    Or,
    Xor,
    Sal,
    Sar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Imm(i32),
    Register(Register),
    /// Placeholder named after an IR temporary; must never reach emission
    Pseudo(String),
    /// Byte offset from %rbp, negative for locals
    Stack(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    AX,
    CX,
    DX,
    R10,
    R11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    E,
    NE,
    G,
    GE,
    L,
    LE,
}
