use lir::*;
use mir::tacky;

use crate::fix_instructions::fix_invalid_instructions;
use crate::replace_pseudoregisters::replace_pseudos;

mod fix_instructions;
mod replace_pseudoregisters;

macro_rules! tb {
    ($variant:ident) => {
        tacky::BinaryOp::$variant
    };
    ($head:ident | $($tail:ident)|+) => {
        tb!($head) | tb!($($tail)|+)
    };
}

/// Select instructions for the whole TACKY program, then legalize: bind
/// pseudo-registers to stack slots and rewrite operand shapes the target
/// rejects.
pub fn gen_assm(tacky: &tacky::TranslationUnit) -> Program {
    let prog = Program {
        func: gen_func(&tacky.func),
    };

    let (replaced, stack_size) = replace_pseudos(&prog);

    fix_invalid_instructions(replaced, stack_size)
}

fn gen_func(func: &tacky::Func) -> Func {
    // frame size is unknown until pseudos are assigned slots; the
    // placeholder is patched during fixups
    let mut instructions = vec![Instruction::AllocateStack(0)];
    instructions.append(&mut gen_instructions(&func.instructions));

    Func {
        name: func.name.clone(),
        instructions,
    }
}

fn gen_instructions(instructions: &[tacky::Instruction]) -> Vec<Instruction> {
    let mut assm_instr = vec![];

    for i in instructions {
        match i {
            tacky::Instruction::Return(val) => {
                assm_instr.push(Instruction::Mov {
                    src: gen_operand(val),
                    dest: Operand::Register(Register::AX),
                });
                assm_instr.push(Instruction::Ret);
            }
            tacky::Instruction::Unary { op, src, dest } => {
                assm_instr.push(Instruction::Mov {
                    src: gen_operand(src),
                    dest: gen_operand(dest),
                });
                assm_instr.push(Instruction::Unary {
                    op: gen_unary(op),
                    dest: gen_operand(dest),
                });
            }
            tacky::Instruction::Binary {
                op,
                first,
                second,
                dest,
            } => {
                if matches!(op, tb!(Divide | Modulo)) {
                    assm_instr.push(Instruction::Mov {
                        src: gen_operand(first),
                        dest: Operand::Register(Register::AX),
                    });
                    assm_instr.push(Instruction::Cdq);
                    assm_instr.push(Instruction::Idiv(gen_operand(second)));
                    assm_instr.push(Instruction::Mov {
                        src: Operand::Register(if *op == tacky::BinaryOp::Divide {
                            Register::AX
                        } else {
                            Register::DX
                        }),
                        dest: gen_operand(dest),
                    })
                } else if matches!(
                    op,
                    tb!(Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual)
                ) {
                    // operands swapped: cmpl b, a sets flags for a - b
                    assm_instr.push(Instruction::Cmp(gen_operand(second), gen_operand(first)));
                    assm_instr.push(Instruction::Mov {
                        src: Operand::Imm(0),
                        dest: gen_operand(dest),
                    });
                    assm_instr.push(Instruction::SetCond {
                        condition: gen_cond(op),
                        dest: gen_operand(dest),
                    });
                } else {
                    assm_instr.push(Instruction::Mov {
                        src: gen_operand(first),
                        dest: gen_operand(dest),
                    });
                    assm_instr.push(Instruction::Binary {
                        op: gen_binary(op),
                        src: gen_operand(second),
                        dest: gen_operand(dest),
                    })
                }
            }
            tacky::Instruction::Copy { src, dest } => assm_instr.push(Instruction::Mov {
                src: gen_operand(src),
                dest: gen_operand(dest),
            }),
            tacky::Instruction::Jump { target } => assm_instr.push(Instruction::Jmp {
                label: target.clone(),
            }),
            tacky::Instruction::JumpIfZero { condition, target } => {
                assm_instr.push(Instruction::Cmp(Operand::Imm(0), gen_operand(condition)));
                assm_instr.push(Instruction::JmpCond {
                    condition: Condition::E,
                    label: target.clone(),
                });
            }
            tacky::Instruction::JumpIfNotZero { condition, target } => {
                assm_instr.push(Instruction::Cmp(Operand::Imm(0), gen_operand(condition)));
                assm_instr.push(Instruction::JmpCond {
                    condition: Condition::NE,
                    label: target.clone(),
                });
            }
            tacky::Instruction::Label(identifier) => {
                assm_instr.push(Instruction::Label(identifier.clone()))
            }
        }
    }

    assm_instr
}

fn gen_unary(operator: &tacky::UnaryOp) -> UnaryOp {
    match operator {
        tacky::UnaryOp::Complement => UnaryOp::Not,
        tacky::UnaryOp::Negate => UnaryOp::Neg,
    }
}

fn gen_binary(operator: &tacky::BinaryOp) -> BinaryOp {
    match operator {
        tacky::BinaryOp::Add => BinaryOp::Add,
        tacky::BinaryOp::Subtract => BinaryOp::Sub,
        tacky::BinaryOp::Multiply => BinaryOp::Mult,
        tacky::BinaryOp::BitwiseAnd => BinaryOp::And,
        tacky::BinaryOp::BitwiseOr => BinaryOp::Or,
        tacky::BinaryOp::BitwiseXor => BinaryOp::Xor,
        tacky::BinaryOp::BitshiftLeft => BinaryOp::Sal,
        tacky::BinaryOp::BitshiftRight => BinaryOp::Sar,
        _ => panic!("Unable to convert {:#?} into assembly BinaryOp", operator),
    }
}

fn gen_operand(operand: &tacky::Val) -> Operand {
    match operand {
        tacky::Val::Constant(val) => Operand::Imm(*val),
        tacky::Val::Var(var) => Operand::Pseudo(var.clone()),
    }
}

fn gen_cond(op: &tacky::BinaryOp) -> Condition {
    match op {
        tacky::BinaryOp::Equal => Condition::E,
        tacky::BinaryOp::NotEqual => Condition::NE,
        tacky::BinaryOp::Less => Condition::L,
        tacky::BinaryOp::LessEqual => Condition::LE,
        tacky::BinaryOp::Greater => Condition::G,
        tacky::BinaryOp::GreaterEqual => Condition::GE,
        _ => panic!("Internal Error: Not a condition operator: {:?}", op),
    }
}

#[cfg(test)]
mod tests {
    use lexer::Lexer;
    use parser::Parser;

    use super::*;

    fn assm_for(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().collect();
        let ast = Parser::new(tokens).parse().unwrap();
        let tacky = mir::gen_tacky(ast);
        gen_assm(&tacky)
    }

    fn operands(instruction: &Instruction) -> Vec<&Operand> {
        match instruction {
            Instruction::Mov { src, dest } => vec![src, dest],
            Instruction::Unary { dest, .. } => vec![dest],
            Instruction::Binary { src, dest, .. } => vec![src, dest],
            Instruction::Cmp(first, second) => vec![first, second],
            Instruction::Idiv(op) => vec![op],
            Instruction::SetCond { dest, .. } => vec![dest],
            Instruction::Cdq
            | Instruction::Jmp { .. }
            | Instruction::JmpCond { .. }
            | Instruction::Label(_)
            | Instruction::AllocateStack(_)
            | Instruction::Ret => vec![],
        }
    }

    fn is_mem(operand: &Operand) -> bool {
        matches!(operand, Operand::Stack(_))
    }

    #[test]
    fn return_constant() {
        let assm = assm_for("int main(void) { return 2; }");

        assert_eq!(
            assm.func.instructions,
            vec![
                Instruction::AllocateStack(0),
                Instruction::Mov {
                    src: Operand::Imm(2),
                    dest: Operand::Register(Register::AX),
                },
                Instruction::Ret,
            ]
        )
    }

    #[test]
    fn no_pseudo_survives_legalization() {
        let assm = assm_for(
            "int main(void) { return ((1 + 3) % (1 + 2) << 1 & 7) * (2 || 0); }",
        );

        for instruction in &assm.func.instructions {
            for operand in operands(instruction) {
                assert!(
                    !matches!(operand, Operand::Pseudo(_)),
                    "pseudo-register leaked: {:?}",
                    instruction
                );
            }
        }
    }

    #[test]
    fn frame_size_counts_distinct_temporaries() {
        let assm = assm_for("int main(void) { return 1 + 2 + 3; }");

        // two temporaries, 4 bytes each
        assert_eq!(assm.func.instructions[0], Instruction::AllocateStack(8))
    }

    #[test]
    fn no_memory_to_memory_instructions() {
        let assm = assm_for(
            "int main(void) { return (1 + 2) + (3 + 4) + (5 | 6) - (7 ^ 8); }",
        );

        for instruction in &assm.func.instructions {
            let mems = operands(instruction)
                .into_iter()
                .filter(|o| is_mem(o))
                .count();
            assert!(mems <= 1, "two memory operands: {:?}", instruction);
        }
    }

    #[test]
    fn division_never_divides_by_immediate() {
        let assm = assm_for("int main(void) { return (1 + 3) % (1 + 2); }");
        let instructions = &assm.func.instructions;

        assert!(instructions.contains(&Instruction::Cdq));
        for instruction in instructions {
            assert!(!matches!(instruction, Instruction::Idiv(Operand::Imm(_))));
        }
    }

    #[test]
    fn immediate_divisor_routed_through_scratch() {
        let assm = assm_for("int main(void) { return 1 % 2; }");
        let instructions = &assm.func.instructions;

        assert!(instructions.contains(&Instruction::Mov {
            src: Operand::Imm(2),
            dest: Operand::Register(Register::R10),
        }));
        assert!(instructions.contains(&Instruction::Idiv(Operand::Register(Register::R10))));
    }

    #[test]
    fn shift_count_in_counter_register() {
        let assm = assm_for("int main(void) { return 1 << (1 + 1); }");

        for instruction in &assm.func.instructions {
            if let Instruction::Binary {
                op: BinaryOp::Sal | BinaryOp::Sar,
                src,
                ..
            } = instruction
            {
                assert!(matches!(
                    src,
                    Operand::Imm(_) | Operand::Register(Register::CX)
                ));
            }
        }
    }

    #[test]
    fn multiply_never_targets_memory() {
        let assm = assm_for("int main(void) { return (1 + 1) * (2 + 2); }");

        for instruction in &assm.func.instructions {
            if let Instruction::Binary {
                op: BinaryOp::Mult,
                dest,
                ..
            } = instruction
            {
                assert!(!is_mem(dest), "imul into memory: {:?}", instruction);
            }
        }
    }

    #[test]
    fn comparison_materializes_flag() {
        let assm = assm_for("int main(void) { return 1 < 2; }");
        let instructions = &assm.func.instructions;

        assert!(instructions
            .iter()
            .any(|i| matches!(i, Instruction::SetCond { condition: Condition::L, .. })));
        // flag destination is zeroed before setcc
        assert!(instructions
            .iter()
            .any(|i| matches!(i, Instruction::Mov { src: Operand::Imm(0), .. })));
    }

    #[test]
    fn jump_if_zero_compares_against_zero() {
        let assm = assm_for("int main(void) { return 0 && 1; }");
        let instructions = &assm.func.instructions;

        assert!(instructions
            .iter()
            .any(|i| matches!(i, Instruction::JmpCond { condition: Condition::E, .. })));
        assert!(instructions
            .iter()
            .any(|i| matches!(i, Instruction::Jmp { .. })));
    }
}
