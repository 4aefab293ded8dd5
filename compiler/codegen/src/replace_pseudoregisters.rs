use std::collections::HashMap;

use lir::*;

/// Slot size for every value; the subset is 32-bit ints only
const SLOT_SIZE: i32 = 4;

#[derive(Debug)]
struct ReplacementState {
    // Offset from rbp, negative and strictly decreasing
    current_offset: i32,
    offset_map: HashMap<String, i32>,
}

/// Bind each distinct pseudo-register to a stack slot, first-encountered
/// order. Returns the rewritten program and the frame size in bytes.
pub fn replace_pseudos(assm_ast: &Program) -> (Program, i32) {
    let mut state = ReplacementState {
        current_offset: 0,
        offset_map: HashMap::new(),
    };

    let instructions = assm_ast
        .func
        .instructions
        .iter()
        .map(|instr| replace_instruction(instr, &mut state))
        .collect();

    let program = Program {
        func: Func {
            name: assm_ast.func.name.clone(),
            instructions,
        },
    };

    (program, -state.current_offset)
}

fn replace_instruction(instruction: &Instruction, state: &mut ReplacementState) -> Instruction {
    match instruction {
        Instruction::Mov { src, dest } => Instruction::Mov {
            src: replace_operand(src, state),
            dest: replace_operand(dest, state),
        },
        Instruction::Unary { op, dest } => Instruction::Unary {
            op: *op,
            dest: replace_operand(dest, state),
        },
        Instruction::Binary { op, src, dest } => Instruction::Binary {
            op: *op,
            src: replace_operand(src, state),
            dest: replace_operand(dest, state),
        },
        Instruction::Cmp(first, second) => Instruction::Cmp(
            replace_operand(first, state),
            replace_operand(second, state),
        ),
        Instruction::Idiv(op) => Instruction::Idiv(replace_operand(op, state)),
        Instruction::SetCond { condition, dest } => Instruction::SetCond {
            condition: *condition,
            dest: replace_operand(dest, state),
        },
        Instruction::Cdq => Instruction::Cdq,
        Instruction::Jmp { label } => Instruction::Jmp {
            label: label.clone(),
        },
        Instruction::JmpCond { condition, label } => Instruction::JmpCond {
            condition: *condition,
            label: label.clone(),
        },
        Instruction::Label(ident) => Instruction::Label(ident.clone()),
        Instruction::AllocateStack(bytes) => Instruction::AllocateStack(*bytes),
        Instruction::Ret => Instruction::Ret,
    }
}

fn replace_operand(operand: &Operand, state: &mut ReplacementState) -> Operand {
    match operand {
        Operand::Pseudo(var) => match state.offset_map.get(var) {
            // Already assigned operand a stack slot
            Some(offset) => Operand::Stack(*offset),
            // Need to assign stack slot
            None => {
                let new_offset = state.current_offset - SLOT_SIZE;

                state.current_offset = new_offset;
                state.offset_map.insert(var.clone(), new_offset);

                Operand::Stack(new_offset)
            }
        },
        _ => operand.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo(name: &str) -> Operand {
        Operand::Pseudo(name.to_string())
    }

    fn program(instructions: Vec<Instruction>) -> Program {
        Program {
            func: Func {
                name: "main".to_string(),
                instructions,
            },
        }
    }

    #[test]
    fn slots_assigned_in_first_encountered_order() {
        let prog = program(vec![
            Instruction::Mov {
                src: Operand::Imm(1),
                dest: pseudo(".tmp0"),
            },
            Instruction::Mov {
                src: pseudo(".tmp0"),
                dest: pseudo(".tmp1"),
            },
        ]);

        let (replaced, stack_size) = replace_pseudos(&prog);

        assert_eq!(
            replaced.func.instructions,
            vec![
                Instruction::Mov {
                    src: Operand::Imm(1),
                    dest: Operand::Stack(-4),
                },
                Instruction::Mov {
                    src: Operand::Stack(-4),
                    dest: Operand::Stack(-8),
                },
            ]
        );
        assert_eq!(stack_size, 8);
    }

    #[test]
    fn repeated_pseudo_reuses_slot() {
        let prog = program(vec![
            Instruction::Mov {
                src: Operand::Imm(1),
                dest: pseudo(".tmp0"),
            },
            Instruction::Unary {
                op: UnaryOp::Neg,
                dest: pseudo(".tmp0"),
            },
        ]);

        let (replaced, stack_size) = replace_pseudos(&prog);

        assert_eq!(
            replaced.func.instructions[1],
            Instruction::Unary {
                op: UnaryOp::Neg,
                dest: Operand::Stack(-4),
            }
        );
        assert_eq!(stack_size, 4);
    }

    #[test]
    fn non_pseudo_operands_untouched() {
        let prog = program(vec![
            Instruction::Mov {
                src: Operand::Imm(2),
                dest: Operand::Register(Register::AX),
            },
            Instruction::Ret,
        ]);

        let (replaced, stack_size) = replace_pseudos(&prog);

        assert_eq!(replaced, prog);
        assert_eq!(stack_size, 0);
    }
}
