use lir::*;

/// Rewrite instruction forms the target rejects and patch the frame-size
/// placeholder left by selection. R10 and R11 are reserved for this pass
/// and never appear in selector output; CX only ever carries shift counts.
pub fn fix_invalid_instructions(ast: Program, stack_size: i32) -> Program {
    Program {
        func: Func {
            name: ast.func.name,
            instructions: fix_instructions(&ast.func.instructions, stack_size),
        },
    }
}

fn fix_instructions(instructions: &[Instruction], stack_size: i32) -> Vec<Instruction> {
    let mut fixed_instr = vec![];

    for i in instructions {
        match i {
            Instruction::AllocateStack(_) => {
                fixed_instr.push(Instruction::AllocateStack(stack_size));
            }
            // movl cannot take two memory operands
            Instruction::Mov {
                src: src @ Operand::Stack(_),
                dest: dest @ Operand::Stack(_),
            } => {
                fixed_instr.push(Instruction::Mov {
                    src: src.clone(),
                    dest: Operand::Register(Register::R10),
                });
                fixed_instr.push(Instruction::Mov {
                    src: Operand::Register(Register::R10),
                    dest: dest.clone(),
                });
            }
            Instruction::Mov { .. } => fixed_instr.push(i.clone()),
            // imull cannot write to memory
            Instruction::Binary {
                op: BinaryOp::Mult,
                src,
                dest: dest @ Operand::Stack(_),
            } => {
                fixed_instr.push(Instruction::Mov {
                    src: dest.clone(),
                    dest: Operand::Register(Register::R11),
                });
                fixed_instr.push(Instruction::Binary {
                    op: BinaryOp::Mult,
                    src: src.clone(),
                    dest: Operand::Register(Register::R11),
                });
                fixed_instr.push(Instruction::Mov {
                    src: Operand::Register(Register::R11),
                    dest: dest.clone(),
                });
            }
            // a variable shift count must sit in %cl
            Instruction::Binary {
                op: op @ (BinaryOp::Sal | BinaryOp::Sar),
                src,
                dest,
            } => match src {
                Operand::Imm(_) | Operand::Register(Register::CX) => fixed_instr.push(i.clone()),
                _ => {
                    fixed_instr.push(Instruction::Mov {
                        src: src.clone(),
                        dest: Operand::Register(Register::CX),
                    });
                    fixed_instr.push(Instruction::Binary {
                        op: *op,
                        src: Operand::Register(Register::CX),
                        dest: dest.clone(),
                    });
                }
            },
            // remaining two-operand forms only reject memory-to-memory
            Instruction::Binary {
                op,
                src: src @ Operand::Stack(_),
                dest: dest @ Operand::Stack(_),
            } => {
                fixed_instr.push(Instruction::Mov {
                    src: src.clone(),
                    dest: Operand::Register(Register::R10),
                });
                fixed_instr.push(Instruction::Binary {
                    op: *op,
                    src: Operand::Register(Register::R10),
                    dest: dest.clone(),
                });
            }
            Instruction::Binary { .. } => fixed_instr.push(i.clone()),
            // cmpl flags operand cannot be an immediate
            Instruction::Cmp(first, second @ Operand::Imm(_)) => {
                fixed_instr.push(Instruction::Mov {
                    src: second.clone(),
                    dest: Operand::Register(Register::R11),
                });
                fixed_instr.push(Instruction::Cmp(
                    first.clone(),
                    Operand::Register(Register::R11),
                ));
            }
            Instruction::Cmp(first @ Operand::Stack(_), second @ Operand::Stack(_)) => {
                fixed_instr.push(Instruction::Mov {
                    src: first.clone(),
                    dest: Operand::Register(Register::R10),
                });
                fixed_instr.push(Instruction::Cmp(
                    Operand::Register(Register::R10),
                    second.clone(),
                ));
            }
            Instruction::Cmp(..) => fixed_instr.push(i.clone()),
            // idivl cannot take an immediate
            Instruction::Idiv(op @ Operand::Imm(_)) => {
                fixed_instr.push(Instruction::Mov {
                    src: op.clone(),
                    dest: Operand::Register(Register::R10),
                });
                fixed_instr.push(Instruction::Idiv(Operand::Register(Register::R10)));
            }
            Instruction::Idiv(_) => fixed_instr.push(i.clone()),
            Instruction::Unary { .. }
            | Instruction::SetCond { .. }
            | Instruction::Cdq
            | Instruction::Jmp { .. }
            | Instruction::JmpCond { .. }
            | Instruction::Label(_)
            | Instruction::Ret => fixed_instr.push(i.clone()),
        }
    }

    fixed_instr
}
