use std::fs::File;
use std::io::{BufWriter, Write};

use lir::*;

type IOResult = std::io::Result<()>;

/// Render the legalized program as GAS assembly text.
pub fn emit(assm: &Program) -> String {
    let mut buffer = Vec::new();

    emit_program(&mut buffer, assm).expect("writing assembly to an in-memory buffer cannot fail");

    String::from_utf8(buffer).expect("emitted assembly is always valid UTF-8")
}

pub fn output(path: impl AsRef<std::path::Path>, assm: &Program) -> IOResult {
    let output = File::create(path)?;
    let mut writer = BufWriter::new(output);

    emit_program(&mut writer, assm)?;

    writer.flush()
}

fn emit_program<W: Write>(writer: &mut W, assm: &Program) -> IOResult {
    emit_func(writer, &assm.func)?;
    emit_stack_note(writer)
}

fn emit_func<W: Write>(writer: &mut W, func: &Func) -> IOResult {
    writeln!(writer, "\t.text")?;
    writeln!(writer, "\t.globl {}", func.name)?;
    writeln!(writer, "{}:", func.name)?;
    writeln!(writer, "\tpushq %rbp")?;
    writeln!(writer, "\tmovq %rsp, %rbp")?;

    for instruction in &func.instructions {
        emit_instruction(writer, instruction)?;
    }

    Ok(())
}

fn emit_instruction<W: Write>(writer: &mut W, instruction: &Instruction) -> IOResult {
    match instruction {
        Instruction::Mov { src, dest } => writeln!(
            writer,
            "\tmovl {}, {}",
            show_operand(src),
            show_operand(dest)
        )?,
        Instruction::Ret => {
            writeln!(writer, "\tmovq %rbp, %rsp")?;
            writeln!(writer, "\tpopq %rbp")?;
            writeln!(writer, "\tret")?
        }
        Instruction::Unary { op, dest } => {
            writeln!(writer, "\t{} {}", show_unary(op), show_operand(dest))?;
        }
        Instruction::Binary {
            op: op @ (BinaryOp::Sal | BinaryOp::Sar),
            src,
            dest,
        } => {
            // the shift count reads as a byte, either $imm or %cl
            writeln!(
                writer,
                "\t{} {}, {}",
                show_binary(op),
                show_byte_operand(src),
                show_operand(dest)
            )?;
        }
        Instruction::Binary { op, src, dest } => {
            writeln!(
                writer,
                "\t{} {}, {}",
                show_binary(op),
                show_operand(src),
                show_operand(dest)
            )?;
        }
        Instruction::Idiv(op) => {
            writeln!(writer, "\tidivl {}", show_operand(op))?;
        }
        Instruction::Cdq => {
            writeln!(writer, "\tcdq")?;
        }
        Instruction::Cmp(first, second) => {
            writeln!(
                writer,
                "\tcmpl {}, {}",
                show_operand(first),
                show_operand(second)
            )?;
        }
        Instruction::Jmp { label } => {
            writeln!(writer, "\tjmp .L_{}", label)?;
        }
        Instruction::JmpCond { condition, label } => {
            writeln!(writer, "\tj{} .L_{}", show_condition(condition), label)?;
        }
        Instruction::SetCond { condition, dest } => {
            writeln!(
                writer,
                "\tset{} {}",
                show_condition(condition),
                show_byte_operand(dest)
            )?;
        }
        Instruction::Label(label) => {
            writeln!(writer, ".L_{}:", label)?;
        }
        Instruction::AllocateStack(0) => {}
        Instruction::AllocateStack(bytes) => {
            writeln!(writer, "\tsubq ${}, %rsp", bytes)?;
        }
    }

    Ok(())
}

fn emit_stack_note<W: Write>(writer: &mut W) -> IOResult {
    writeln!(writer, "\t.section .note.GNU-stack,\"\",@progbits")
}

fn show_operand(operand: &Operand) -> String {
    match operand {
        Operand::Imm(val) => format!("${}", val),
        Operand::Register(reg) => show_reg(reg),
        Operand::Stack(offset) => format!("{}(%rbp)", offset),
        Operand::Pseudo(name) => {
            panic!("Internal Error: pseudo-register '{}' reached emission", name)
        }
    }
}

fn show_byte_operand(operand: &Operand) -> String {
    match operand {
        Operand::Register(reg) => show_byte_reg(reg),
        _ => show_operand(operand),
    }
}

fn show_reg(reg: &Register) -> String {
    format!(
        "%{}",
        match reg {
            Register::AX => "eax",
            Register::CX => "ecx",
            Register::DX => "edx",
            Register::R10 => "r10d",
            Register::R11 => "r11d",
        }
    )
}

fn show_byte_reg(reg: &Register) -> String {
    match reg {
        Register::AX => "%al".to_string(),
        Register::CX => "%cl".to_string(),
        Register::DX => "%dl".to_string(),
        Register::R10 => "%r10b".to_string(),
        Register::R11 => "%r11b".to_string(),
    }
}

fn show_unary(op: &UnaryOp) -> String {
    match op {
        UnaryOp::Neg => "negl".to_string(),
        UnaryOp::Not => "notl".to_string(),
    }
}

fn show_binary(op: &BinaryOp) -> String {
    match op {
        BinaryOp::Add => "addl".to_string(),
        BinaryOp::Sub => "subl".to_string(),
        BinaryOp::Mult => "imull".to_string(),
        BinaryOp::And => "andl".to_string(),
        BinaryOp::Or => "orl".to_string(),
        BinaryOp::Xor => "xorl".to_string(),
        BinaryOp::Sal => "sall".to_string(),
        BinaryOp::Sar => "sarl".to_string(),
    }
}

fn show_condition(condition: &Condition) -> String {
    (match condition {
        Condition::E => "e",
        Condition::NE => "ne",
        Condition::G => "g",
        Condition::GE => "ge",
        Condition::L => "l",
        Condition::LE => "le",
    })
    .to_string()
}
