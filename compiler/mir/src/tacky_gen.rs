use ast::BinaryOp;

use crate::tacky;
use crate::tacky::{Instruction, Val};

/// Owns the temporary and label counters for one compilation. A fresh
/// generator is created per translation unit, so repeated compilations
/// cannot interfere with each other's numbering.
struct TackyGen {
    tmp_counter: i32,
    label_counter: i32,
}

pub fn gen_tacky(ast: ast::TranslationUnit) -> tacky::TranslationUnit {
    let mut gen = TackyGen::new();

    tacky::TranslationUnit {
        func: gen.tacky_func(ast.func),
    }
}

impl TackyGen {
    fn new() -> Self {
        Self {
            tmp_counter: 0,
            label_counter: 0,
        }
    }

    fn make_temp(&mut self) -> Val {
        let name = format!(".tmp{}", self.tmp_counter);
        self.tmp_counter += 1;
        Val::Var(name)
    }

    /// One index per short-circuit lowering, shared by both labels of that
    /// occurrence.
    fn make_label_group(&mut self) -> i32 {
        let group = self.label_counter;
        self.label_counter += 1;
        group
    }

    fn tacky_func(&mut self, func: ast::Func) -> tacky::Func {
        tacky::Func {
            name: func.ident,
            instructions: self.tacky_stmt(func.body),
        }
    }

    fn tacky_stmt(&mut self, stmt: ast::Stmt) -> Vec<Instruction> {
        match stmt {
            ast::Stmt::Return { expr } => {
                let (mut instructions, value) = self.tacky_expr(expr);

                instructions.push(Instruction::Return(value));

                instructions
            }
        }
    }

    fn tacky_expr(&mut self, expr: ast::Expr) -> (Vec<Instruction>, Val) {
        match expr {
            ast::Expr::Constant(val) => (vec![], Val::Constant(val)),
            ast::Expr::Unary { op, expr } => {
                let (mut instructions, inner) = self.tacky_expr(*expr);
                let dest = self.make_temp();

                instructions.push(Instruction::Unary {
                    op: tacky_unop(op),
                    src: inner,
                    dest: dest.clone(),
                });

                (instructions, dest)
            }
            ast::Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                let (left_instr, v1) = self.tacky_expr(*left);
                let (right_instr, v2) = self.tacky_expr(*right);
                let group = self.make_label_group();
                let false_label = format!("and_false.{}", group);
                let end_label = format!("and_end.{}", group);
                let dest = self.make_temp();

                let instructions = left_instr
                    .into_iter()
                    .chain(vec![Instruction::JumpIfZero {
                        condition: v1,
                        target: false_label.clone(),
                    }])
                    .chain(right_instr)
                    .chain(vec![
                        Instruction::JumpIfZero {
                            condition: v2,
                            target: false_label.clone(),
                        },
                        Instruction::Copy {
                            src: Val::Constant(1),
                            dest: dest.clone(),
                        },
                        Instruction::Jump {
                            target: end_label.clone(),
                        },
                        Instruction::Label(false_label),
                        Instruction::Copy {
                            src: Val::Constant(0),
                            dest: dest.clone(),
                        },
                        Instruction::Label(end_label),
                    ])
                    .collect();

                (instructions, dest)
            }
            ast::Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => {
                let (left_instr, v1) = self.tacky_expr(*left);
                let (right_instr, v2) = self.tacky_expr(*right);
                let group = self.make_label_group();
                let true_label = format!("or_true.{}", group);
                let end_label = format!("or_end.{}", group);
                let dest = self.make_temp();

                let instructions = left_instr
                    .into_iter()
                    .chain(vec![Instruction::JumpIfNotZero {
                        condition: v1,
                        target: true_label.clone(),
                    }])
                    .chain(right_instr)
                    .chain(vec![
                        Instruction::JumpIfNotZero {
                            condition: v2,
                            target: true_label.clone(),
                        },
                        Instruction::Copy {
                            src: Val::Constant(0),
                            dest: dest.clone(),
                        },
                        Instruction::Jump {
                            target: end_label.clone(),
                        },
                        Instruction::Label(true_label),
                        Instruction::Copy {
                            src: Val::Constant(1),
                            dest: dest.clone(),
                        },
                        Instruction::Label(end_label),
                    ])
                    .collect();

                (instructions, dest)
            }
            ast::Expr::Binary { op, left, right } => {
                // left is fully lowered before right, fixing evaluation order
                let (left_instr, left_inner) = self.tacky_expr(*left);
                let (mut right_instr, right_inner) = self.tacky_expr(*right);
                let dest = self.make_temp();

                let mut instructions = left_instr;
                instructions.append(&mut right_instr);
                instructions.push(Instruction::Binary {
                    op: tacky_binop(op),
                    first: left_inner,
                    second: right_inner,
                    dest: dest.clone(),
                });

                (instructions, dest)
            }
        }
    }
}

fn tacky_unop(op: ast::UnaryOp) -> tacky::UnaryOp {
    match op {
        ast::UnaryOp::Complement => tacky::UnaryOp::Complement,
        ast::UnaryOp::Negate => tacky::UnaryOp::Negate,
    }
}

fn tacky_binop(op: ast::BinaryOp) -> tacky::BinaryOp {
    match op {
        BinaryOp::Add => tacky::BinaryOp::Add,
        BinaryOp::Subtract => tacky::BinaryOp::Subtract,
        BinaryOp::Multiply => tacky::BinaryOp::Multiply,
        BinaryOp::Divide => tacky::BinaryOp::Divide,
        BinaryOp::Modulo => tacky::BinaryOp::Modulo,

        BinaryOp::Equal => tacky::BinaryOp::Equal,
        BinaryOp::NotEqual => tacky::BinaryOp::NotEqual,
        BinaryOp::Less => tacky::BinaryOp::Less,
        BinaryOp::LessEqual => tacky::BinaryOp::LessEqual,
        BinaryOp::Greater => tacky::BinaryOp::Greater,
        BinaryOp::GreaterEqual => tacky::BinaryOp::GreaterEqual,

        BinaryOp::BitwiseAnd => tacky::BinaryOp::BitwiseAnd,
        BinaryOp::BitwiseOr => tacky::BinaryOp::BitwiseOr,
        BinaryOp::BitwiseXor => tacky::BinaryOp::BitwiseXor,
        BinaryOp::BitshiftLeft => tacky::BinaryOp::BitshiftLeft,
        BinaryOp::BitshiftRight => tacky::BinaryOp::BitshiftRight,

        BinaryOp::And | BinaryOp::Or => {
            panic!("Internal error, cannot convert {:?} directly to TACKY", op)
        }
    }
}
